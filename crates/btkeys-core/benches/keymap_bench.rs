//! Criterion benchmarks for key lookup and report encoding.
//!
//! Every button press goes through `Keymap::press_report` and
//! `KeyboardReport::to_bytes`, so both must stay in the table-lookup class.
//!
//! Run with:
//! ```bash
//! cargo bench --package btkeys-core --bench keymap_bench
//! ```

use btkeys_core::keymap::android;
use btkeys_core::{HidKeyCode, KeyCode, Keymap, Modifier, Shortcut};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Android key codes covering letters, digits, navigation and one unmapped key.
const BENCH_KEYCODES: &[KeyCode] = &[
    KeyCode::A,
    KeyCode::Z,
    KeyCode::DIGIT_1,
    KeyCode::DIGIT_0,
    KeyCode::ENTER,
    KeyCode::ESCAPE,
    KeyCode::TAB,
    KeyCode::SPACE,
    KeyCode::DEL,
    KeyCode::F1,
    KeyCode::F12,
    KeyCode::DPAD_UP,
    KeyCode::DPAD_LEFT,
    KeyCode::CTRL_LEFT,
    KeyCode::VOLUME_UP,
];

fn bench_keycode_to_hid(c: &mut Criterion) {
    let mut group = c.benchmark_group("keymap_android");
    let keymap = Keymap::android();

    group.bench_function("usage_for_single", |b| {
        b.iter(|| keymap.usage_for(black_box(KeyCode::A)))
    });

    group.bench_function("usage_for_batch_15", |b| {
        b.iter(|| {
            BENCH_KEYCODES
                .iter()
                .map(|&code| keymap.usage_for(black_box(code)))
                .collect::<Vec<_>>()
        })
    });

    // Reverse lookup is a linear scan; first row vs last row.
    for hid in [HidKeyCode::Digit0, HidKeyCode::NumpadEqual] {
        group.bench_with_input(
            BenchmarkId::new("hid_to_keycode", format!("{hid:?}")),
            &hid,
            |b, &hid| b.iter(|| android::hid_to_keycode(black_box(hid))),
        );
    }

    group.finish();
}

fn bench_press_report(c: &mut Criterion) {
    let mut group = c.benchmark_group("report_encoding");
    let keymap = Keymap::android();
    let plain = Shortcut::new(KeyCode::A);
    let chord = Shortcut::with_modifiers(KeyCode::T, [Modifier::Ctrl, Modifier::Shift]);

    group.bench_function("press_report_plain", |b| {
        b.iter(|| keymap.press_report(black_box(&plain)))
    });

    group.bench_function("press_report_to_bytes_chord", |b| {
        b.iter(|| {
            keymap
                .press_report(black_box(&chord))
                .map(|report| report.to_bytes())
        })
    });

    group.bench_function("parse_shortcut", |b| {
        b.iter(|| black_box("Ctrl+Shift+T").parse::<Shortcut>())
    });

    group.finish();
}

criterion_group!(benches, bench_keycode_to_hid, bench_press_report);
criterion_main!(benches);
