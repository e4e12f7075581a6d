use anyhow::{Result, bail};
use tracing::info;

use crate::cli::CombineArgs;
use crate::config::load_config;
use crate::model::non_empty;
use crate::scoring::combine_scores;
use crate::store::{ScoreKey, ScoreStore, SqliteScoreStore};
use crate::util::write_json_stdout;

pub fn store_key(args: &CombineArgs) -> Result<ScoreKey> {
    let Some(scope) = non_empty(args.scope.as_deref()) else {
        bail!("--scope is required when persisting a score");
    };
    let Some(component) = args.component else {
        bail!("--component is required when persisting a score");
    };

    let target = non_empty(args.target.as_deref())
        .unwrap_or(component.as_str())
        .to_string();
    Ok(ScoreKey::new(scope, args.metric, component, target))
}

pub fn run(args: CombineArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let score = combine_scores(args.automated, args.rating, args.multiplier, &config.scoring)?;

    if let Some(path) = args.score_db.as_deref() {
        let key = store_key(&args)?;
        let mut store = SqliteScoreStore::open(path)?;
        store.put(&key, &score)?;
        info!(
            key = %key.storage_key(),
            final_score = score.final_score,
            entries = store.len()?,
            "persisted component score"
        );
    }

    write_json_stdout(&score)
}
