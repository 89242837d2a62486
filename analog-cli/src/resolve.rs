//! Text rendering of a resolved keymap.

use analog_keymap::{BootReport, Handler, Keymap, NoCustom};

fn describe(handler: &Handler) -> String {
    match handler {
        Handler::Noop => "noop".to_string(),
        Handler::Key(key) => format!("{:?}@{}", key.key(), key.threshold()),
        Handler::Custom(never) => match *never {},
    }
}

/// One table row per channel. A `^` after the owner marks a cell that
/// reaches a lower layer's handler through transparency.
fn render_layer<const L: usize, const C: usize>(
    keymap: &Keymap<NoCustom, L, C>,
    layer: usize,
) -> String {
    if !keymap.is_loaded(layer) {
        return format!("layer {layer}: not loaded\n\n");
    }

    let mut text = format!("layer {layer}\n");
    text.push_str(&format!(
        "  {:>3}  {:>5}  {:<14} {:<6} {:>4}\n",
        "ch", "owner", "handler", "filter", "band"
    ));
    for channel in 0..keymap.channel_count() {
        let (Some(owner), Some(handler), Some(filter), Some(band)) = (
            keymap.owner(layer, channel),
            keymap.handler(layer, channel),
            keymap.filter(layer, channel),
            keymap.sensitivity(layer, channel),
        ) else {
            continue;
        };
        let inherited = if owner == layer { ' ' } else { '^' };
        text.push_str(&format!(
            "  {:>3}  {:>4}{}  {:<14} {:<6} {:>4}\n",
            channel,
            owner,
            inherited,
            describe(handler),
            filter.to_string(),
            band
        ));
    }
    text.push('\n');
    text
}

/// Render every layer as a table of channel, owner layer, handler, filter
/// and sensitivity, followed by the boot report.
pub fn render<const L: usize, const C: usize>(
    keymap: &Keymap<NoCustom, L, C>,
    report: &BootReport,
) -> String {
    let mut out = String::new();

    for layer in 0..keymap.layer_count() {
        out.push_str(&render_layer(keymap, layer));
    }

    if report.is_clean() {
        out.push_str("boot: clean\n");
        return out;
    }
    for row in report.rows() {
        out.push_str(&format!("boot: {row}\n"));
    }
    if report.overflow() > 0 {
        out.push_str(&format!("boot: {} more rejected layers\n", report.overflow()));
    }
    if let Some(issue) = report.channel_order() {
        out.push_str(&format!("boot: {issue}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use analog_keymap::{Config, Entry, Keycode};

    #[test]
    fn test_render_marks_inherited_cells() {
        let rows: &[&[Entry]] = &[
            &[Entry::Key(Keycode::A), Entry::NoOp],
            &[Entry::Trans, Entry::Key(Keycode::B)],
        ];
        let (keymap, report) = Keymap::<NoCustom, 2, 2>::resolve(&Config::new(rows));
        let text = render(&keymap, &report);
        assert!(text.contains("A@127"));
        assert!(text.contains("0^"));
        assert!(text.contains("noop"));
        assert!(text.ends_with("boot: clean\n"));
    }

    #[test]
    fn test_render_covers_every_cell() {
        let rows: &[&[Entry]] = &[
            &[Entry::Key(Keycode::A), Entry::NoOp],
            &[Entry::Trans, Entry::Key(Keycode::B)],
        ];
        let (keymap, report) = Keymap::<NoCustom, 2, 2>::resolve(&Config::new(rows));
        let text = render(&keymap, &report);
        let headers = text.lines().filter(|l| l.starts_with("layer ")).count();
        let cells = text
            .lines()
            .filter(|l| l.contains('@') || l.contains("noop"))
            .count();
        assert_eq!(headers, 2);
        assert_eq!(cells, 4);
    }

    #[test]
    fn test_render_reports_rejections() {
        let rows: &[&[Entry]] = &[
            &[Entry::Key(Keycode::A), Entry::Key(Keycode::B)],
            &[Entry::Key(Keycode::A)],
        ];
        let (keymap, report) = Keymap::<NoCustom, 2, 2>::resolve(&Config::new(rows));
        let text = render(&keymap, &report);
        assert!(text.contains("layer 1: not loaded"));
        assert!(text.contains("boot: layer 1: row has 1 entries, expected 2 channels"));
    }
}
