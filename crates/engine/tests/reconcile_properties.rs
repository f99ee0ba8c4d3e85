//! End-to-end reconciliation properties.
//!
//! Each test drives a full pass (load → score → assign → apply) against the
//! in-memory chat client and asserts on the recorded side effects:
//!
//! - reconciliation is idempotent
//! - reaction evidence preserves associations across config rewrites
//! - title equality is the fallback signal
//! - disjoint states converge by delete + create
//! - matching is deterministic under ties
//! - reaction add/remove grant and revoke exactly the mapped role
//! - a rejected settings document changes nothing

use std::sync::Arc;

use rolemenu_core::{ChannelId, GuildId, MessageId, RoleId, UserId};
use rolemenu_engine::testing::{InMemoryChatClient, Op};
use rolemenu_engine::{
    load_settings, EngineState, PassOutcome, ReactionEvent, RoleEventHandler, Synchronizer,
};

/// Test helper: unwrap a Result or panic with context.
fn unwrap_result<T, E: std::fmt::Display>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => panic!("{context}: {e}"),
    }
}

const GUILD: u64 = 100;
const CHANNEL: u64 = 200;
const ROLE_BLUE: u64 = 400;
const ROLE_RED: u64 = 401;
const ALICE: u64 = 1;
const BOB: u64 = 2;

fn space() -> InMemoryChatClient {
    InMemoryChatClient::new(GuildId::new(GUILD), ChannelId::new(CHANNEL))
        .with_role(RoleId::new(300), "reloaders")
        .with_role(RoleId::new(ROLE_BLUE), "blue team")
        .with_role(RoleId::new(ROLE_RED), "red team")
        .with_member(UserId::new(ALICE), "alice", &[RoleId::new(ROLE_BLUE)])
        .with_member(UserId::new(BOB), "bob", &[RoleId::new(ROLE_RED)])
}

fn menu_json(title: &str, reactions: &[(&str, u64)]) -> String {
    let reactions = reactions
        .iter()
        .map(|(symbol, role)| format!(r#""{symbol}": {role}"#))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        r#"{{"title": "{title}", "message": "React to join", "color": [0, 0, 255],
            "reactions": {{{reactions}}}}}"#
    )
}

fn settings_json(menus: &[String]) -> String {
    format!(
        r#"{{"guild": {GUILD}, "channel": {CHANNEL}, "reload_roles": [300],
            "messages": [{}]}}"#,
        menus.join(", ")
    )
}

async fn run_pass(client: &InMemoryChatClient, raw: &str) -> rolemenu_engine::PassReport {
    let config = unwrap_result(load_settings(raw, client).await, "settings should load");
    Synchronizer::new(client).run_pass(&config).await
}

fn mutating_ops(ops: &[Op]) -> Vec<&Op> {
    ops.iter()
        .filter(|op| {
            matches!(
                op,
                Op::Edited(_) | Op::Created(_) | Op::Deleted(_) | Op::Cleared(_)
            )
        })
        .collect()
}

#[tokio::test]
async fn idempotence_second_pass_changes_nothing() {
    // GIVEN: an empty channel and two desired menus
    let client = space();
    let raw = settings_json(&[
        menu_json("Teams", &[("🔵", ROLE_BLUE)]),
        menu_json("Colors", &[("🔴", ROLE_RED)]),
    ]);

    // WHEN: reconciliation runs twice with no external changes between runs
    let first = run_pass(&client, &raw).await;
    client.take_ops().await;
    let second = run_pass(&client, &raw).await;

    // THEN: the second pass performs zero edits, creates, and deletes
    assert_eq!(first.outcome, PassOutcome::Success);
    assert_eq!(second.outcome, PassOutcome::Success);
    let ops = client.take_ops().await;
    assert!(
        mutating_ops(&ops).is_empty(),
        "second pass should not mutate: {ops:?}"
    );
    assert_eq!(second.associations.len(), 2);
}

#[tokio::test]
async fn correlation_preserves_association_regardless_of_order() {
    // GIVEN: a live message whose 🔵 reactors already hold the blue role
    let client = space();
    let config = unwrap_result(
        load_settings(&settings_json(&[menu_json("Old title", &[("🔵", ROLE_BLUE)])]), &client)
            .await,
        "seed settings should load",
    );
    let seeded = client
        .seed_own_message(
            &config.messages[0].embed,
            &[("🔵", true, &[UserId::new(ALICE)])],
        )
        .await;

    // WHEN: the desired list is regenerated with the matching entry last
    // and every title changed
    let raw = settings_json(&[
        menu_json("Brand new", &[("🟣", ROLE_RED)]),
        menu_json("Renamed menu", &[("🔵", ROLE_BLUE)]),
    ]);
    let report = run_pass(&client, &raw).await;

    // THEN: the live message is associated with the entry its reactions
    // imply; it is neither deleted nor duplicated
    let entry = report
        .associations
        .get(&seeded)
        .unwrap_or_else(|| panic!("seeded message should stay associated"));
    assert_eq!(entry.embed.title, "Renamed menu");
    let ops = client.take_ops().await;
    assert!(!ops.iter().any(|op| matches!(op, Op::Deleted(m) if *m == seeded)));
    assert_eq!(
        ops.iter().filter(|op| matches!(op, Op::Created(_))).count(),
        1,
        "only the genuinely new entry is created"
    );
}

#[tokio::test]
async fn title_fallback_matches_unreacted_messages() {
    // GIVEN: a live message nobody reacted to
    let client = space();
    let stale = unwrap_result(
        load_settings(&settings_json(&[menu_json("Pronouns", &[])]), &client).await,
        "seed settings should load",
    );
    let seeded = client.seed_own_message(&stale.messages[0].embed, &[]).await;

    // WHEN: a desired entry carries the same title
    let raw = settings_json(&[menu_json("Pronouns", &[("🔵", ROLE_BLUE)])]);
    let report = run_pass(&client, &raw).await;

    // THEN: the message is matched, not recreated
    assert!(report.associations.contains_key(&seeded));
    let ops = client.take_ops().await;
    assert!(mutating_ops(&ops).is_empty(), "no churn expected: {ops:?}");
}

#[tokio::test]
async fn disjoint_states_converge_by_delete_and_create() {
    // GIVEN: two live bot messages sharing nothing with three desired entries
    let client = space();
    let stale = unwrap_result(
        load_settings(
            &settings_json(&[menu_json("Gone A", &[]), menu_json("Gone B", &[])]),
            &client,
        )
        .await,
        "seed settings should load",
    );
    for menu in &stale.messages {
        client.seed_own_message(&menu.embed, &[]).await;
    }

    // WHEN: reconciliation runs against a fully disjoint desired list
    let raw = settings_json(&[
        menu_json("New A", &[]),
        menu_json("New B", &[]),
        menu_json("New C", &[]),
    ]);
    let report = run_pass(&client, &raw).await;

    // THEN: both old messages are deleted and all three entries are created
    assert_eq!(report.outcome, PassOutcome::Success);
    let ops = client.take_ops().await;
    assert_eq!(ops.iter().filter(|op| matches!(op, Op::Deleted(_))).count(), 2);
    assert_eq!(ops.iter().filter(|op| matches!(op, Op::Created(_))).count(), 3);
    assert_eq!(report.associations.len(), 3);
}

#[tokio::test]
async fn tied_scores_match_the_first_enumerated_message() {
    // GIVEN: two live messages with identical nonzero correlation evidence
    let client = space();
    let seedcfg = unwrap_result(
        load_settings(&settings_json(&[menu_json("Teams", &[("🔵", ROLE_BLUE)])]), &client).await,
        "seed settings should load",
    );
    let first = client
        .seed_own_message(
            &seedcfg.messages[0].embed,
            &[("🔵", true, &[UserId::new(ALICE)])],
        )
        .await;
    let second = client
        .seed_own_message(
            &seedcfg.messages[0].embed,
            &[("🔵", true, &[UserId::new(ALICE)])],
        )
        .await;

    // WHEN: one desired entry claims that evidence
    let raw = settings_json(&[menu_json("Teams", &[("🔵", ROLE_BLUE)])]);
    let report = run_pass(&client, &raw).await;

    // THEN: the first-enumerated message wins the tie, the other is surplus
    assert!(report.associations.contains_key(&first));
    assert!(!report.associations.contains_key(&second));
    let ops = client.take_ops().await;
    assert!(ops.iter().any(|op| matches!(op, Op::Deleted(m) if *m == second)));
}

#[tokio::test]
async fn reaction_add_and_remove_are_symmetric() {
    // GIVEN: a reconciled menu mapping 🔵 to the blue role
    let client = space().with_member(UserId::new(7), "carol", &[]);
    let raw = settings_json(&[menu_json("Teams", &[("🔵", ROLE_BLUE)])]);
    let state = Arc::new(EngineState::new());
    let report = run_pass(&client, &raw).await;
    state.swap_associations(report.associations).await;
    let menu_id = *unwrap_result(
        state.associations().await.keys().next().ok_or("no association"),
        "pass should associate the created message",
    );
    client.take_ops().await;

    let handler = RoleEventHandler::new(Arc::clone(&state));
    let event = |from_us| ReactionEvent {
        message: menu_id,
        user: UserId::new(7),
        symbol_name: "🔵".to_string(),
        from_us,
    };

    // WHEN: carol reacts, then immediately removes the reaction
    handler.reaction_added(&client, &event(false)).await;
    handler.reaction_removed(&client, &event(false)).await;

    // THEN: exactly one grant and one revoke of the mapped role, nothing else
    let ops = client.take_ops().await;
    assert_eq!(
        ops,
        vec![
            Op::RoleGranted(UserId::new(7), RoleId::new(ROLE_BLUE)),
            Op::RoleRevoked(UserId::new(7), RoleId::new(ROLE_BLUE)),
        ]
    );
}

#[tokio::test]
async fn rejected_settings_leave_state_untouched() {
    // GIVEN: a committed configuration and a populated association table
    let client = space();
    let state = Arc::new(EngineState::new());
    let good = settings_json(&[menu_json("Teams", &[("🔵", ROLE_BLUE)])]);
    let config = unwrap_result(load_settings(&good, &client).await, "good settings load");
    state.commit_config(config).await;
    let report = {
        let config = state.config().await;
        let config = unwrap_result(config.ok_or("no config"), "config should be committed");
        Synchronizer::new(&client).run_pass(&config).await
    };
    state.swap_associations(report.associations).await;
    let committed_before = state.config().await.map(|c| c.messages.len());
    let associations_before = state.associations().await.len();

    // WHEN: reload attempts with a missing key and with a foreign channel
    for bad in [
        r#"{"guild": 100, "channel": 200, "messages": []}"#.to_string(),
        format!(r#"{{"guild": {GUILD}, "channel": 999, "reload_roles": [300], "messages": []}}"#),
    ] {
        assert!(
            load_settings(&bad, &client).await.is_err(),
            "document should be rejected: {bad}"
        );
    }

    // THEN: committed configuration and associations are unchanged
    assert_eq!(state.config().await.map(|c| c.messages.len()), committed_before);
    assert_eq!(state.associations().await.len(), associations_before);
}

#[tokio::test]
async fn degraded_scoring_reports_failure_but_still_applies() {
    // GIVEN: a reactor whose member lookup fails at the platform
    let client = space().with_failing_member(UserId::new(ALICE));
    let seedcfg = unwrap_result(
        load_settings(&settings_json(&[menu_json("Teams", &[("🔵", ROLE_BLUE)])]), &client).await,
        "seed settings should load",
    );
    client
        .seed_own_message(
            &seedcfg.messages[0].embed,
            &[("🔵", true, &[UserId::new(ALICE)])],
        )
        .await;

    // WHEN: reconciliation runs
    let raw = settings_json(&[menu_json("Teams", &[("🔵", ROLE_BLUE)])]);
    let report = run_pass(&client, &raw).await;

    // THEN: the pass completes (title fallback still matches) but reports
    // the degraded outcome
    assert_eq!(report.outcome, PassOutcome::Failed);
    assert_eq!(report.associations.len(), 1);
}

#[tokio::test]
async fn emoji_failure_reports_partial_outcome() {
    // GIVEN: a platform that rejects one configured symbol
    let client = space().with_failing_symbol("🟢");
    let raw = settings_json(&[
        menu_json("Teams", &[("🟢", ROLE_BLUE)]),
        menu_json("Colors", &[("🔴", ROLE_RED)]),
    ]);

    // WHEN: reconciliation runs
    let report = run_pass(&client, &raw).await;

    // THEN: the pass reports the emoji error but the other entry is intact
    assert_eq!(report.outcome, PassOutcome::EmojiError);
    let ops = client.take_ops().await;
    assert!(ops
        .iter()
        .any(|op| matches!(op, Op::ReactionAdded(_, s) if s == "🔴")));
    assert_eq!(report.associations.len(), 2);
}
