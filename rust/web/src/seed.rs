use crate::store::{Store, StoreError};
use athena_model::{Player, Ruleset, Session, StatType, StatValue};
use chrono::{DateTime, Utc};

/// Active duration of the sample session, in minutes
pub const SAMPLE_SESSION_MINUTES: u32 = 120;

const SAMPLE_PLAYERS: [&str; 3] = ["atla", "claudia", "daniel"];

/// The Munchkin "Classic" ruleset used as sample data.
pub fn sample_ruleset() -> Result<Ruleset, StoreError> {
    let mut rules = Ruleset::new("Munchkin", "Classic");
    rules.ranking = "{playerLevel} descending".to_string();
    rules.win_condition = "{playerLevel} > 9".to_string();
    rules
        .add_stat("playerLevel", "Player Level", StatType::Int, StatValue::Int(1))?
        .add_stat("itemLevel", "Item Level", StatType::Int, StatValue::Int(0))?
        .add_stat("battleStrength", "Battle Level", StatType::Int, StatValue::Int(0))?;
    Ok(rules)
}

pub fn sample_session(ruleset: &Ruleset, now: DateTime<Utc>) -> Session {
    let mut session = Session::new(now, SAMPLE_SESSION_MINUTES, ruleset.id);
    for name in SAMPLE_PLAYERS {
        session.add_player(Player::seeded(name, ruleset));
    }
    session
}

/// Wipes both collections and writes one sample ruleset and session.
pub async fn reset_and_seed(
    store: &dyn Store,
    now: DateTime<Utc>,
) -> Result<(Ruleset, Session), StoreError> {
    store.reset().await?;

    let ruleset = sample_ruleset()?;
    let session = sample_session(&ruleset, now);
    store.insert_ruleset(&ruleset).await?;
    store.insert_session(&session).await?;

    tracing::info!(
        ruleset_id = %ruleset.id,
        session_id = %session.id,
        "sample data seeded"
    );
    Ok((ruleset, session))
}
