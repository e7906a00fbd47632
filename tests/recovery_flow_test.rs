//! End-to-end check cycles against the in-memory host.
//!
//! Every test runs on a paused clock, so command timestamps are exact
//! multiples of the configured delays.

mod common;

use common::{command_offsets, harness, test_config, wait_for, NOTIFY_CHANNEL};
use ppm_sentinel::adapters::memory::DEFAULT_REPLY_DELAY;
use ppm_sentinel::domain::models::{
    CycleOutcome, Embed, EmbedField, RecoveryTrigger, RemediationOutcome, SettingKey,
    SettingValue, StartOutcome, VerifyOutcome,
};
use ppm_sentinel::services::recovery_orchestrator::{
    MISSING_IDENTITY_ALERT, OFFLINE_ALERT, TIMEOUT_NOTICE, VERIFY_FAILURE, VERIFY_SUCCESS,
    ZERO_VALUE_ALERT,
};

#[tokio::test(start_paused = true)]
async fn test_healthy_value_takes_no_action() {
    let h = harness(test_config());
    h.host.script_reply("ppm", "Status for <@42>\n🎁 **3.5**");

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(report.outcome, CycleOutcome::Healthy { value: 3.5 });
    assert_eq!(report.remediation, None);
    assert_eq!(h.host.command_names(), vec!["ppm"]);
}

#[tokio::test(start_paused = true)]
async fn test_clear_precedes_check_by_clear_delay() {
    let h = harness(test_config());
    h.settings
        .set(SettingKey::SendClearCommand, SettingValue::Flag(true));
    h.host.script_reply("ppm", "<@42> 🎁 **1**");

    h.session.run_check_now().await.unwrap();

    assert_eq!(
        command_offsets(&h.host),
        vec![("clear".to_string(), 0), ("ppm".to_string(), 1_000)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_zero_value_restarts_and_verifies() {
    let config = test_config();
    let h = harness(config.clone());
    h.host.script_reply("ppm", "<@42> — 🎁 **0**");
    h.host.script_reply("ppm", "<@42> — 🎁 **5**");

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Recovery {
            trigger: RecoveryTrigger::ZeroValue,
            start: StartOutcome::Accepted,
            verify: Some(VerifyOutcome::Passed { value: 5.0 }),
        }
    );

    // ppm reply after 500ms, stop, reload delay, start timing out after 1s,
    // verify wait, then the second ppm.
    assert_eq!(
        command_offsets(&h.host),
        vec![
            ("ppm".to_string(), 0),
            ("stop".to_string(), 500),
            ("start".to_string(), 500 + u128::from(config.timing.reload_delay_ms)),
            ("ppm".to_string(), 500 + 6_000 + 1_000 + 3_000),
        ]
    );

    assert!(
        wait_for(
            || h.host.sent_to(NOTIFY_CHANNEL).iter().any(|m| m == VERIFY_SUCCESS),
            1_000
        )
        .await
    );
    let sent = h.host.sent_to(NOTIFY_CHANNEL);
    let alert = sent.iter().position(|m| m == ZERO_VALUE_ALERT).unwrap();
    let success = sent.iter().position(|m| m == VERIFY_SUCCESS).unwrap();
    assert!(alert < success);
}

#[tokio::test(start_paused = true)]
async fn test_offline_starts_without_stop() {
    let h = harness(test_config());
    h.host.script_reply("ppm", "❌ Cluster not started");
    h.host.script_reply("ppm", "Cluster not started");

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Recovery {
            trigger: RecoveryTrigger::Offline,
            start: StartOutcome::Accepted,
            verify: Some(VerifyOutcome::Failed),
        }
    );
    assert_eq!(h.host.command_names(), vec!["ppm", "start", "ppm"]);

    assert!(
        wait_for(
            || h.host.sent_to(NOTIFY_CHANNEL).iter().any(|m| m == VERIFY_FAILURE),
            1_000
        )
        .await
    );
    assert!(h.host.sent_to(NOTIFY_CHANNEL).iter().any(|m| m == OFFLINE_ALERT));
}

#[tokio::test(start_paused = true)]
async fn test_reply_without_identity_restarts_after_timeout() {
    let h = harness(test_config());
    h.host.script_reply("ppm", "<@7> — 🎁 **3**");
    h.host.script_reply("ppm", "<@42> — 🎁 **1**");

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Recovery {
            trigger: RecoveryTrigger::MissingIdentity,
            start: StartOutcome::Accepted,
            verify: Some(VerifyOutcome::Passed { value: 1.0 }),
        }
    );
    // The stop only goes out once the full check timeout has elapsed.
    let offsets = command_offsets(&h.host);
    assert_eq!(offsets[1], ("stop".to_string(), 2_000));

    assert!(
        wait_for(
            || h.host.sent_to(NOTIFY_CHANNEL).iter().any(|m| m == MISSING_IDENTITY_ALERT),
            1_000
        )
        .await
    );
}

#[tokio::test(start_paused = true)]
async fn test_mention_in_content_does_not_take_value_from_embed() {
    let h = harness(test_config());
    let mut reply = h.host.bot_message("<@42> used /ppm");
    reply.embeds.push(Embed {
        description: Some("<@7> Bob — 🎁 **5**".to_string()),
        ..Default::default()
    });
    h.host.script_message("ppm", reply, DEFAULT_REPLY_DELAY);
    h.host.script_reply("ppm", "<@42> — 🎁 **1**");

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Recovery {
            trigger: RecoveryTrigger::MissingIdentity,
            start: StartOutcome::Accepted,
            verify: Some(VerifyOutcome::Passed { value: 1.0 }),
        }
    );
    assert_eq!(command_offsets(&h.host)[1], ("stop".to_string(), 2_000));
}

#[tokio::test(start_paused = true)]
async fn test_value_in_embed_field_is_read() {
    let h = harness(test_config());
    let mut reply = h.host.bot_message("Status report");
    reply.embeds.push(Embed {
        title: Some("Members".to_string()),
        description: None,
        fields: vec![
            EmbedField {
                name: "Bob".to_string(),
                value: "<@7> Bob — 🎁 **0**".to_string(),
            },
            EmbedField {
                name: "Me".to_string(),
                value: "<@42> me — 🎁 **6**".to_string(),
            },
        ],
    });
    h.host.script_message("ppm", reply, DEFAULT_REPLY_DELAY);

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(report.outcome, CycleOutcome::Healthy { value: 6.0 });
    assert_eq!(h.host.command_names(), vec!["ppm"]);
}

#[tokio::test(start_paused = true)]
async fn test_no_reply_takes_no_action() {
    let h = harness(test_config());
    h.settings.set(SettingKey::Verbose, SettingValue::Flag(true));

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(report.outcome, CycleOutcome::NoReply);
    assert_eq!(h.host.command_names(), vec!["ppm"]);
    assert!(
        wait_for(
            || h.host.sent_to(NOTIFY_CHANNEL).iter().any(|m| m == TIMEOUT_NOTICE),
            1_000
        )
        .await
    );
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_retry_then_escalation() {
    let h = harness(test_config());
    h.host.script_reply("ppm", "Cluster not started");
    h.host
        .script_reply("start", "Please wait 0:05 before starting again.");
    h.host
        .script_reply("start", "Please wait 0:03 before starting again.");

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Recovery {
            trigger: RecoveryTrigger::Offline,
            start: StartOutcome::CooldownEscalated,
            verify: None,
        }
    );
    // Second start waits for the refusal (500ms), the cooldown and the buffer.
    let offsets = command_offsets(&h.host);
    assert_eq!(offsets.len(), 3);
    assert_eq!(offsets[2].1 - offsets[1].1, 500 + 5_000 + 500);

    assert!(
        wait_for(
            || {
                h.host
                    .sent_to(NOTIFY_CHANNEL)
                    .iter()
                    .any(|m| m.contains("Start still on cooldown"))
            },
            1_000
        )
        .await
    );
}

#[tokio::test(start_paused = true)]
async fn test_cooldown_retry_succeeds() {
    let h = harness(test_config());
    h.host.script_reply("ppm", "Cluster not started");
    h.host
        .script_reply("start", "Please wait 0:02 before starting again.");
    h.host.script_reply("start", "Cluster started!");
    h.host.script_reply("ppm", "<@42> — 🎁 **2**");

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(
        report.outcome,
        CycleOutcome::Recovery {
            trigger: RecoveryTrigger::Offline,
            start: StartOutcome::AcceptedAfterCooldown,
            verify: Some(VerifyOutcome::Passed { value: 2.0 }),
        }
    );
    assert_eq!(h.host.command_names(), vec!["ppm", "start", "start", "ppm"]);
}

#[tokio::test(start_paused = true)]
async fn test_overlapping_checks_race() {
    let h = harness(test_config());
    h.host.script_reply("ppm", "<@42> — 🎁 **4**");

    let (a, b) = tokio::join!(h.session.run_check_now(), h.session.run_check_now());
    let mut outcomes = vec![a.unwrap().outcome, b.unwrap().outcome];
    outcomes.sort_by_key(|o| matches!(o, CycleOutcome::Skipped));

    assert_eq!(
        outcomes,
        vec![CycleOutcome::Healthy { value: 4.0 }, CycleOutcome::Skipped]
    );
}

#[tokio::test(start_paused = true)]
async fn test_helper_mode_stops_zero_members() {
    let mut config = test_config();
    config.bot.helper_role_id = "999".to_string();
    let h = harness(config);
    h.host.grant_role("42", "999");
    h.host.script_reply(
        "ppm",
        "Group **En:1:2**\n<@42> me 👑 Leader — 🎁 **4**\n<@7> other — 🎁 **0**\n<@8> third — 🎁 **0**",
    );

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(report.outcome, CycleOutcome::Healthy { value: 4.0 });
    assert_eq!(
        report.remediation,
        Some(RemediationOutcome::MembersStopped {
            identities: vec!["7".to_string(), "8".to_string()],
        })
    );

    let commands = h.host.commands();
    let stops: Vec<_> = commands.iter().filter(|c| c.name == "stop").collect();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[0].options.get("user").map(String::as_str), Some("7"));
    assert_eq!(
        stops[1].at.duration_since(stops[0].at).as_millis(),
        200,
        "helper stops are spaced by the helper stop delay"
    );

    let reports = h.host.sent_to(NOTIFY_CHANNEL);
    assert!(reports.iter().any(|m| m.contains("Group Remediation")));
}

#[tokio::test(start_paused = true)]
async fn test_helper_mode_closes_all_zero_group() {
    let mut config = test_config();
    config.bot.helper_role_id = "999".to_string();
    config.bot.secondary_channel_id = "group-channel".to_string();
    let h = harness(config);
    h.host.grant_role("42", "999");
    h.host.script_reply(
        "ppm",
        "Group **En:1:2**\n<@42> me 👑 Leader — 🎁 **0**\n<@7> other — 🎁 **0**",
    );
    h.host.script_reply("ppm", "<@42> — 🎁 **1**");

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(
        report.remediation,
        Some(RemediationOutcome::GroupClosed {
            group_id: "En:1:2".to_string(),
        })
    );
    let close = h
        .host
        .commands()
        .into_iter()
        .find(|c| c.name == "close")
        .unwrap();
    assert_eq!(close.channel_id, "group-channel");
    assert_eq!(close.options.get("group").map(String::as_str), Some("En:1:2"));
}

#[tokio::test(start_paused = true)]
async fn test_helper_mode_without_role_is_not_eligible() {
    let mut config = test_config();
    config.bot.helper_role_id = "999".to_string();
    let h = harness(config);
    h.host
        .script_reply("ppm", "<@42> me — 🎁 **4**\n<@7> other — 🎁 **0**");

    let report = h.session.run_check_now().await.unwrap();

    assert_eq!(report.remediation, Some(RemediationOutcome::NotEligible));
    assert_eq!(h.host.command_names(), vec!["ppm"]);
}
