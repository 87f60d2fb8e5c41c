//! Benchmarks for the manifest rewrite pipeline:
//! parse → per-URI rewrite → serialize → version transform.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use hls_relay::hls::{
    source::{MediaPlaylistSource, MultiVariantSource},
    version,
};
use hls_relay::server::context::ProxyContext;
use std::collections::BTreeMap;
use url::Url;

fn media_manifest(segments: usize) -> String {
    let mut manifest = String::from(
        "#EXTM3U\n#EXT-X-VERSION:6\n#EXT-X-TARGETDURATION:4\n#EXT-X-MEDIA-SEQUENCE:0\n",
    );
    for i in 0..segments {
        manifest.push_str(&format!("#EXTINF:4.000,\nseg-{i}.ts\n"));
    }
    manifest.push_str("#EXT-X-ENDLIST\n");
    manifest
}

fn master_manifest(variants: usize) -> String {
    let mut manifest =
        String::from("#EXTM3U\n#EXT-X-VERSION:6\n#EXT-X-INDEPENDENT-SEGMENTS\n");
    for i in 0..variants {
        manifest.push_str(&format!(
            "#EXT-X-STREAM-INF:BANDWIDTH={}\nv{i}/media.m3u8\n",
            500_000 * (i + 1)
        ));
    }
    manifest
}

fn request_context() -> ProxyContext {
    let mut params = BTreeMap::new();
    params.insert(
        "url".to_string(),
        "https://origin.example/live/master.m3u8".to_string(),
    );
    params.insert("forceVersion".to_string(), "4".to_string());
    ProxyContext::new(params)
}

fn bench_master_rewrite(c: &mut Criterion) {
    let manifest = master_manifest(12);
    let url = Url::parse("https://origin.example/live/master.m3u8").unwrap();
    let ctx = request_context();

    c.bench_function("master_rewrite_12_variants", |b| {
        b.iter(|| {
            let source =
                MultiVariantSource::from_text(url.clone(), black_box(&manifest)).unwrap();
            let content = source
                .to_text(|_uri| ctx.variant_params("https://origin.example/live"))
                .unwrap();
            black_box(version::force_version(&content, 4))
        })
    });
}

fn bench_media_rewrite(c: &mut Criterion) {
    let manifest = media_manifest(500);
    let url = Url::parse("https://origin.example/live/v0/media.m3u8").unwrap();
    let ctx = request_context();

    c.bench_function("media_rewrite_500_segments_redirect", |b| {
        b.iter(|| {
            let source =
                MediaPlaylistSource::from_text(url.clone(), None, black_box(&manifest)).unwrap();
            let content = source.to_text(|uri| ctx.segment_params(uri)).unwrap();
            black_box(version::force_version(&content, 4))
        })
    });

    let base = Url::parse("https://origin.example/live/").unwrap();
    c.bench_function("media_rewrite_500_segments_direct", |b| {
        b.iter(|| {
            let source = MediaPlaylistSource::from_text(
                url.clone(),
                Some(base.clone()),
                black_box(&manifest),
            )
            .unwrap();
            black_box(
                source
                    .to_text(hls_relay::server::context::direct_params)
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_master_rewrite, bench_media_rewrite);
criterion_main!(benches);
