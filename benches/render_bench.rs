use criterion::{black_box, criterion_group, criterion_main, Criterion};
use facex::render::OverlayRenderer;
use facex::results::ResultsView;
use facex::ProfileResponse;

fn payload() -> String {
    let matches: Vec<serde_json::Value> = (0..30)
        .map(|i| {
            serde_json::json!({
                "date": 1709316000 + i * 3600,
                "mode": "5v5",
                "result": if i % 3 == 0 { "lose" } else { "win" },
                "score": "13 / 9",
                "map": "de_mirage",
                "kills": 20 + i % 7,
                "deaths": "17",
                "assists": 4,
                "match_url": format!("https://www.faceit.com/en/cs2/room/{}", i)
            })
        })
        .collect();

    serde_json::json!({
        "player_id": "bench-1",
        "nickname": "bencher",
        "country": "DE",
        "faceit": {"level": 9, "elo": "1999", "csgo_elo": 2100, "url": "https://www.faceit.com/en/players/bencher"},
        "steam": {"nickname": "bencher", "id_64": "76561197960287930"},
        "stats": {"matches": "2411", "win_rate_percent": "52%", "headshot_percent": 47,
                  "kd_ratio": "1.08", "adr": 81.7, "last_30_matches_avg_kills": 18.9},
        "match_history": matches,
        "bans": [{"reason": "cheating", "start_date": "01.02.2023", "end_date": "01.02.2024"}]
    })
    .to_string()
}

fn bench_decode(c: &mut Criterion) {
    let body = payload();
    c.bench_function("decode_profile", |b| {
        b.iter(|| ProfileResponse::from_slice(black_box(body.as_bytes())).unwrap())
    });
}

fn bench_overlay_card(c: &mut Criterion) {
    let profile = ProfileResponse::from_slice(payload().as_bytes()).unwrap();
    let renderer = OverlayRenderer::default();
    c.bench_function("render_overlay_card", |b| {
        b.iter(|| renderer.profile(black_box(&profile)))
    });
}

fn bench_results_page(c: &mut Criterion) {
    let profile = ProfileResponse::from_slice(payload().as_bytes()).unwrap();
    c.bench_function("render_results_page", |b| {
        b.iter(|| {
            let view = ResultsView::build(black_box(&profile)).unwrap();
            view.render("/static")
        })
    });
}

criterion_group!(benches, bench_decode, bench_overlay_card, bench_results_page);
criterion_main!(benches);
