//! Benchmarks for page mounting and scrolling.
//!
//! Measures:
//! - Mounting the portfolio page (layout, elements, observers)
//! - A steady scroll from top to bottom, revealing everything on the way

use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use unveil_core::Stage;
use unveil_page::{Page, PageConfig};
use unveil_theme::ThemeState;

fn bench_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("page");
    let theme = ThemeState::default();

    group.bench_function("mount_portfolio", |b| {
        b.iter(|| {
            let page = Page::mount(Stage::default(), PageConfig::portfolio(), &theme).unwrap();
            black_box(page.snapshot(0));
        });
    });

    group.finish();
}

/// Scroll 40px at a time with a frame of time between steps
fn bench_scroll_through(c: &mut Criterion) {
    let mut group = c.benchmark_group("page");
    let theme = ThemeState::default();

    group.bench_function("scroll_through", |b| {
        b.iter(|| {
            let mut page = Page::mount(Stage::default(), PageConfig::portfolio(), &theme).unwrap();
            let max = page.layout().max_scroll(page.config().layout.viewport_height);
            while page.scroll_y() < max {
                page.scroll_by(40.0);
                page.advance(16);
            }
            black_box(page.snapshot(page.now_ms()).revealed_count());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_mount, bench_scroll_through);
criterion_main!(benches);
