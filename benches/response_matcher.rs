//! Matcher throughput on realistic single-user and group replies.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ppm_sentinel::services::response_matcher::ResponseMatcher;

fn group_reply(members: usize) -> String {
    let mut text = String::from("Group `En:-430275058:1:1`\n");
    for i in 0..members {
        let crown = if i == 0 { " 👑 Leader" } else { "" };
        text.push_str(&format!("<@{}> member{i}{crown} — 🎁 **{}**\n", 1000 + i, i % 3));
    }
    text
}

fn bench_match_status(c: &mut Criterion) {
    let matcher = ResponseMatcher::new();
    let single = "Status for <@123456789012345678>\nPacks per minute:\n🎁 **12.5**";
    let group = group_reply(10);

    c.bench_function("match_status_single", |b| {
        b.iter(|| matcher.match_status(black_box(single), black_box("123456789012345678")));
    });
    c.bench_function("match_status_group_last_member", |b| {
        b.iter(|| matcher.match_status(black_box(&group), black_box("1009")));
    });
}

fn bench_match_roster(c: &mut Criterion) {
    let matcher = ResponseMatcher::new();
    let group = group_reply(10);

    c.bench_function("match_roster_10", |b| {
        b.iter(|| matcher.match_roster(black_box(&group)));
    });
}

fn bench_match_cooldown(c: &mut Criterion) {
    let matcher = ResponseMatcher::new();
    let text = "You must wait 12:34 before starting again.";

    c.bench_function("match_cooldown", |b| {
        b.iter(|| matcher.match_cooldown(black_box(text)));
    });
}

criterion_group!(
    benches,
    bench_match_status,
    bench_match_roster,
    bench_match_cooldown
);
criterion_main!(benches);
