use athena_model::{
    ModelError, PlayerUpdate, Ruleset, RulesetDraft, Session, SessionUpdate, StatDraft, StatType,
    StatValue,
};
use chrono::{TimeDelta, Utc};
use serde_json::json;
use std::collections::BTreeMap;

fn munchkin() -> Ruleset {
    let draft: RulesetDraft = serde_json::from_value(json!({
        "game": "Munchkin",
        "ruleset": "Classic",
        "stats": [
            { "name": "playerLevel", "label": "Player Level", "defaultValue": 1 },
            { "name": "itemLevel", "label": "Item Level", "statType": "int" },
            { "name": "curse", "label": "Cursed", "statType": "bool", "defaultValue": false }
        ],
        "winCondition": "{playerLevel} > 9"
    }))
    .expect("decode draft");
    Ruleset::from_draft(draft, Utc::now()).expect("valid ruleset")
}

fn update(name: &str, stats: &[(&str, StatValue)]) -> SessionUpdate {
    SessionUpdate {
        players: vec![PlayerUpdate {
            name: name.to_string(),
            stats: stats
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect::<BTreeMap<_, _>>(),
        }],
    }
}

#[test]
fn draft_stats_get_types_and_defaults() {
    let rules = munchkin();

    let level = rules.stat("playerLevel").expect("playerLevel");
    assert_eq!(level.stat_type, StatType::Int);
    assert_eq!(level.default_value, StatValue::Int(1));

    let items = rules.stat("itemLevel").expect("itemLevel");
    assert_eq!(items.default_value, StatValue::Int(0));
    assert_eq!(rules.used_in_games, 0);
}

#[test]
fn a_full_game_of_updates() {
    let rules = munchkin();
    let players = vec!["atla".to_string(), "claudia".to_string()];
    let mut session = Session::start(&rules, &players, Utc::now());

    for level in 2..=10 {
        session
            .apply_update(&update("claudia", &[("playerLevel", StatValue::Int(level))]))
            .expect("level up");
    }
    session
        .apply_update(&update("atla", &[("curse", StatValue::Bool(true))]))
        .expect("curse");

    let claudia = session.player("claudia").expect("claudia");
    assert_eq!(claudia.stats["playerLevel"], StatValue::Int(10));
    let atla = session.player("atla").expect("atla");
    assert_eq!(atla.stats["playerLevel"], StatValue::Int(1));
    assert_eq!(atla.stats["curse"], StatValue::Bool(true));
}

#[test]
fn rejected_update_changes_nothing() {
    let rules = munchkin();
    let mut session = Session::start(&rules, &["atla".to_string()], Utc::now());
    let before = session.clone();

    let err = session
        .apply_update(&update(
            "atla",
            &[
                ("itemLevel", StatValue::Int(3)),
                ("playerLevel", StatValue::String("high".into())),
            ],
        ))
        .expect_err("mistyped");

    assert!(matches!(err, ModelError::StatTypeMismatch { .. }));
    assert_eq!(session, before);
}

#[test]
fn activity_flag_follows_elapsed_minutes() {
    let rules = munchkin();
    let start = Utc::now();
    let session = Session::start(&rules, &[], start);

    assert!(!session.is_active_at(start));
    assert!(!session.is_active_at(start + TimeDelta::minutes(5)));
    assert!(session.is_active_at(start + TimeDelta::minutes(6)));
}

#[test]
fn untyped_stat_without_default_is_rejected() {
    let draft = RulesetDraft {
        game: "Catan".into(),
        ruleset: "Base".into(),
        stats: vec![StatDraft {
            name: "points".into(),
            ..Default::default()
        }],
        ..Default::default()
    };

    let err = Ruleset::from_draft(draft, Utc::now()).expect_err("untyped");
    assert_eq!(err, ModelError::UntypedStat("points".into()));
}
