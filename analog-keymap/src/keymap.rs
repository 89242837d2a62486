//! Keymap resolution.
//!
//! [`Keymap::resolve`] turns a [`Config`] into fixed-size `[layer][channel]`
//! tables of handlers, filters and sensitivities. It runs once at boot;
//! afterwards the tables are only read, and handlers are only mutated by
//! the engine calling into them.
//!
//! Transparent cells don't get their own handler. Every cell records the
//! layer that *owns* its handler instead, so a key reached through any
//! number of transparent layers is the very same [`AnalogKey`] instance on
//! all of them and its pressed state follows it across layer changes.
//!
//! A layer whose row is malformed is rejected as a whole and reported in
//! the [`BootReport`]. Layer numbers never shift: a rejected layer is
//! simply inert while active.

use core::array;

use heapless::Vec;

use crate::config::{Config, Entry, Invert, InvertRow, Sensitivity};
use crate::error::{BootIssue, RejectReason, RowError};
use crate::filter::{invert_row, Filter};
use crate::handler::{AnalogKey, EventHandler, Handler};

/// Hysteresis band used when the configuration gives none.
pub const DEFAULT_SENSITIVITY: u16 = 1;

/// How many rejected rows a [`BootReport`] keeps.
pub const MAX_REPORTED: usize = 8;

/// Problems found while resolving a keymap. Advisory only.
#[derive(Debug, Default)]
pub struct BootReport {
    rows: Vec<RowError, MAX_REPORTED>,
    overflow: usize,
    channel_order: Option<BootIssue>,
}

impl BootReport {
    fn reject(&mut self, layer: usize, reason: RejectReason) {
        warn!("keymap layer {} rejected: {}", layer, reason);
        if self.rows.push(RowError { layer, reason }).is_err() {
            self.overflow += 1;
        }
    }

    /// Rejected layers, in layer order.
    pub fn rows(&self) -> &[RowError] {
        &self.rows
    }

    /// Rejections that didn't fit in the report.
    pub fn overflow(&self) -> usize {
        self.overflow
    }

    pub fn channel_order(&self) -> Option<BootIssue> {
        self.channel_order
    }

    pub fn is_rejected(&self, layer: usize) -> bool {
        self.rows.iter().any(|row| row.layer == layer)
    }

    pub fn is_clean(&self) -> bool {
        self.rows.is_empty() && self.overflow == 0 && self.channel_order.is_none()
    }
}

/// Resolved `[layer][channel]` tables.
#[derive(Debug)]
pub struct Keymap<C, const LAYERS: usize, const CHANNELS: usize> {
    /// Handler instances, stored at the cell that defined them.
    handlers: [[Handler<C>; CHANNELS]; LAYERS],
    /// Layer holding the handler each cell dispatches to.
    owners: [[usize; CHANNELS]; LAYERS],
    filters: [[Filter; CHANNELS]; LAYERS],
    sensitivity: [[u16; CHANNELS]; LAYERS],
    loaded: [bool; LAYERS],
    order: [usize; CHANNELS],
}

impl<C, const LAYERS: usize, const CHANNELS: usize> Keymap<C, LAYERS, CHANNELS>
where
    C: EventHandler + Clone,
{
    /// Resolve a configuration into tables.
    ///
    /// Layers are resolved bottom-up so transparent cells can point at the
    /// already resolved owners below them.
    pub fn resolve(config: &Config<'_, C>) -> (Self, BootReport) {
        let mut keymap = Self::empty();
        let mut report = BootReport::default();

        match config.channel_order.map(resolve_order::<CHANNELS>) {
            Some(Ok(order)) => keymap.order = order,
            Some(Err(issue)) => {
                warn!("ignoring channel order: {}", issue);
                report.channel_order = Some(issue);
            }
            None => {}
        }

        for (layer, row) in config.event_map.iter().enumerate() {
            if layer >= LAYERS {
                report.reject(layer, RejectReason::TooManyLayers { capacity: LAYERS });
                continue;
            }
            match keymap.load_layer(layer, row, config) {
                Ok(()) => debug!("keymap layer {} loaded", layer),
                Err(reason) => report.reject(layer, reason),
            }
        }

        (keymap, report)
    }

    fn load_layer(
        &mut self,
        layer: usize,
        row: &[Entry<C>],
        config: &Config<'_, C>,
    ) -> Result<(), RejectReason> {
        if row.len() != CHANNELS {
            return Err(RejectReason::WidthMismatch {
                expected: CHANNELS,
                found: row.len(),
            });
        }

        let mut owners = [layer; CHANNELS];
        for (channel, entry) in row.iter().enumerate() {
            if entry.is_transparent() {
                owners[channel] = self
                    .owner_below(layer, channel)
                    .ok_or(RejectReason::UnresolvedTransparent { channel })?;
            }
        }

        let handlers: [Handler<C>; CHANNELS] = array::from_fn(|channel| match &row[channel] {
            Entry::NoOp | Entry::Trans => Handler::Noop,
            Entry::Key(key) => Handler::Key(AnalogKey::new(*key)),
            Entry::Analog(key) => Handler::Key(*key),
            Entry::Custom(custom) => Handler::Custom(custom.clone()),
        });

        let filters = match config.filter_map {
            Some(map) => {
                let row = map.get(layer).ok_or(RejectReason::MissingRow { table: "filter" })?;
                <[Filter; CHANNELS]>::try_from(*row).map_err(|_| RejectReason::FilterShape {
                    expected: CHANNELS,
                    found: row.len(),
                })?
            }
            None => array::from_fn(|channel| {
                let owner = owners[channel];
                let handler = if owner == layer {
                    &handlers[channel]
                } else {
                    &self.handlers[owner][channel]
                };
                handler.preferred_filter().unwrap_or_default()
            }),
        };
        let filters = match config.invert {
            Invert::None => filters,
            Invert::All(flag) => invert_row(&filters, &InvertRow::All(flag))?,
            Invert::PerLayer(rows) => {
                let row = rows.get(layer).ok_or(RejectReason::MissingRow { table: "invert" })?;
                invert_row(&filters, row)?
            }
        };

        let sensitivity = match config.sensitivity {
            Sensitivity::Default => [DEFAULT_SENSITIVITY; CHANNELS],
            Sensitivity::Global(band) => [band; CHANNELS],
            Sensitivity::PerKey(map) => {
                let row = map
                    .get(layer)
                    .ok_or(RejectReason::MissingRow { table: "sensitivity" })?;
                <[u16; CHANNELS]>::try_from(*row).map_err(|_| RejectReason::SensitivityShape {
                    expected: CHANNELS,
                    found: row.len(),
                })?
            }
        };

        self.handlers[layer] = handlers;
        self.owners[layer] = owners;
        self.filters[layer] = filters;
        self.sensitivity[layer] = sensitivity;
        self.loaded[layer] = true;
        Ok(())
    }
}

impl<C, const LAYERS: usize, const CHANNELS: usize> Keymap<C, LAYERS, CHANNELS> {
    fn empty() -> Self {
        Self {
            handlers: array::from_fn(|_| array::from_fn(|_| Handler::Noop)),
            owners: [[0; CHANNELS]; LAYERS],
            filters: [[Filter::default(); CHANNELS]; LAYERS],
            sensitivity: [[DEFAULT_SENSITIVITY; CHANNELS]; LAYERS],
            loaded: [false; LAYERS],
            order: array::from_fn(|channel| channel),
        }
    }

    /// Owner of the nearest loaded layer below `layer`. Lower layers are
    /// already resolved, so their owner is never a transparent cell.
    fn owner_below(&self, layer: usize, channel: usize) -> Option<usize> {
        (0..layer)
            .rev()
            .find(|&lower| self.loaded[lower])
            .map(|lower| self.owners[lower][channel])
    }

    pub fn layer_count(&self) -> usize {
        LAYERS
    }

    pub fn channel_count(&self) -> usize {
        CHANNELS
    }

    /// Whether `layer` resolved. Out of range layers are never loaded.
    pub fn is_loaded(&self, layer: usize) -> bool {
        self.loaded.get(layer).copied().unwrap_or(false)
    }

    /// Layer whose handler instance serves `(layer, channel)`.
    pub fn owner(&self, layer: usize, channel: usize) -> Option<usize> {
        self.is_loaded(layer)
            .then(|| self.owners[layer].get(channel).copied())
            .flatten()
    }

    pub fn handler(&self, layer: usize, channel: usize) -> Option<&Handler<C>> {
        let owner = self.owner(layer, channel)?;
        Some(&self.handlers[owner][channel])
    }

    pub fn handler_mut(&mut self, layer: usize, channel: usize) -> Option<&mut Handler<C>> {
        let owner = self.owner(layer, channel)?;
        Some(&mut self.handlers[owner][channel])
    }

    pub fn filter(&self, layer: usize, channel: usize) -> Option<Filter> {
        self.is_loaded(layer)
            .then(|| self.filters[layer].get(channel).copied())
            .flatten()
    }

    pub fn sensitivity(&self, layer: usize, channel: usize) -> Option<u16> {
        self.is_loaded(layer)
            .then(|| self.sensitivity[layer].get(channel).copied())
            .flatten()
    }

    /// Physical input read as logical `channel`.
    pub fn physical(&self, channel: usize) -> usize {
        self.order[channel]
    }
}

fn resolve_order<const N: usize>(order: &[usize]) -> Result<[usize; N], BootIssue> {
    let order = <[usize; N]>::try_from(order).map_err(|_| BootIssue::ChannelOrderLength {
        expected: N,
        found: order.len(),
    })?;
    let mut seen = [false; N];
    for (index, &physical) in order.iter().enumerate() {
        match seen.get_mut(physical) {
            Some(slot) if !*slot => *slot = true,
            _ => return Err(BootIssue::ChannelOrderInvalid { index }),
        }
    }
    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keycode::Keycode;
    use crate::NoCustom;

    type Map2x2 = Keymap<NoCustom, 2, 2>;
    type Map3x1 = Keymap<NoCustom, 3, 1>;

    const A: Entry = Entry::Key(Keycode::A);
    const B: Entry = Entry::Key(Keycode::B);
    const T: Entry = Entry::Trans;
    const N: Entry = Entry::NoOp;

    fn key_of(handler: Option<&Handler>) -> Option<Keycode> {
        handler.and_then(Handler::as_key).map(AnalogKey::key)
    }

    #[test]
    fn bare_keys_become_analog_keys() {
        let (map, report) = Map2x2::resolve(&Config::new(&[&[A, B], &[B, N]]));
        assert!(report.is_clean());
        assert_eq!(key_of(map.handler(0, 0)), Some(Keycode::A));
        assert_eq!(key_of(map.handler(0, 1)), Some(Keycode::B));
        assert_eq!(key_of(map.handler(1, 0)), Some(Keycode::B));
        assert!(map.handler(1, 1).is_some_and(Handler::is_noop));
        assert_eq!(
            map.handler(0, 0).and_then(Handler::as_key).map(AnalogKey::threshold),
            Some(crate::DEFAULT_THRESHOLD)
        );
    }

    #[test]
    fn transparent_shares_lower_instance() {
        let (map, report) = Map3x1::resolve(&Config::new(&[&[A], &[T], &[T]]));
        assert!(report.is_clean());
        assert_eq!(map.owner(0, 0), Some(0));
        assert_eq!(map.owner(1, 0), Some(0));
        assert_eq!(map.owner(2, 0), Some(0));
        let base = map.handler(0, 0).unwrap() as *const Handler;
        assert!(core::ptr::eq(map.handler(2, 0).unwrap(), base));
    }

    #[test]
    fn transparent_stops_at_nearest_concrete_layer() {
        let (map, _) = Map3x1::resolve(&Config::new(&[&[A], &[B], &[T]]));
        assert_eq!(map.owner(2, 0), Some(1));
        assert_eq!(key_of(map.handler(2, 0)), Some(Keycode::B));
    }

    #[test]
    fn transparent_over_noop_is_noop() {
        let (map, _) = Map2x2::resolve(&Config::new(&[&[N, A], &[T, T]]));
        assert!(map.handler(1, 0).is_some_and(Handler::is_noop));
        assert_eq!(map.owner(1, 1), Some(0));
    }

    #[test]
    fn transparent_on_base_layer_is_rejected() {
        let (map, report) = Map2x2::resolve(&Config::new(&[&[A, T], &[B, B]]));
        assert!(!map.is_loaded(0));
        assert!(map.is_loaded(1));
        assert_eq!(
            report.rows(),
            [RowError {
                layer: 0,
                reason: RejectReason::UnresolvedTransparent { channel: 1 }
            }]
        );
    }

    #[test]
    fn transparent_skips_rejected_layer() {
        let (map, report) = Map3x1::resolve(&Config::new(&[&[A], &[A, B], &[T]]));
        assert!(report.is_rejected(1));
        assert_eq!(map.owner(2, 0), Some(0));
    }

    #[test]
    fn width_mismatch_rejects_only_that_layer() {
        let (map, report) = Map2x2::resolve(&Config::new(&[&[A, B], &[A]]));
        assert!(map.is_loaded(0));
        assert!(!map.is_loaded(1));
        assert!(map.handler(1, 0).is_none());
        assert!(map.filter(1, 0).is_none());
        assert_eq!(
            report.rows(),
            [RowError {
                layer: 1,
                reason: RejectReason::WidthMismatch {
                    expected: 2,
                    found: 1
                }
            }]
        );
    }

    #[test]
    fn extra_layers_are_rejected() {
        let (map, report) = Map2x2::resolve(&Config::new(&[&[A, B], &[A, B], &[A, B]]));
        assert!(map.is_loaded(0) && map.is_loaded(1));
        assert_eq!(
            report.rows()[0].reason,
            RejectReason::TooManyLayers { capacity: 2 }
        );
    }

    #[test]
    fn derived_filters_follow_handlers() {
        const SOFT: Entry = Entry::Analog(AnalogKey::new(Keycode::C).with_filter(Filter::shift(4)));
        let (map, _) = Map2x2::resolve(&Config::new(&[&[SOFT, A], &[T, T]]));
        assert_eq!(map.filter(0, 0).map(|f| f.max_output()), Some(0x0FFF));
        assert_eq!(map.filter(0, 1).map(|f| f.max_output()), Some(0xFF));
        // inherited through transparency
        assert_eq!(map.filter(1, 0).map(|f| f.max_output()), Some(0x0FFF));
    }

    #[test]
    fn explicit_filter_map() {
        let filters: &[&[Filter]] = &[&[Filter::shift(2), Filter::shift(3)], &[Filter::shift(1)]];
        let config = Config::new(&[&[A, B], &[A, B]]).with_filters(filters);
        let (map, report) = Map2x2::resolve(&config);
        assert_eq!(map.filter(0, 1).map(|f| f.apply(64)), Some(8));
        assert_eq!(
            report.rows(),
            [RowError {
                layer: 1,
                reason: RejectReason::FilterShape {
                    expected: 2,
                    found: 1
                }
            }]
        );
    }

    #[test]
    fn invert_everything() {
        let config = Config::new(&[&[A, B]]).with_invert(Invert::All(true));
        let (map, _) = Keymap::<NoCustom, 1, 2>::resolve(&config);
        assert!(map.filter(0, 0).unwrap().is_inverted());
        assert!(map.filter(0, 1).unwrap().is_inverted());
    }

    #[test]
    fn invert_per_layer_rows() {
        let rows = [InvertRow::All(true), InvertRow::Each(&[false, true])];
        let config = Config::new(&[&[A, B], &[A, B]]).with_invert(Invert::PerLayer(&rows));
        let (map, report) = Map2x2::resolve(&config);
        assert!(report.is_clean());
        assert!(map.filter(0, 0).unwrap().is_inverted());
        assert!(!map.filter(1, 0).unwrap().is_inverted());
        assert!(map.filter(1, 1).unwrap().is_inverted());
    }

    #[test]
    fn missing_invert_row_rejects_layer() {
        let rows = [InvertRow::All(false)];
        let config = Config::new(&[&[A, B], &[A, B]]).with_invert(Invert::PerLayer(&rows));
        let (map, report) = Map2x2::resolve(&config);
        assert!(map.is_loaded(0));
        assert_eq!(
            report.rows()[0],
            RowError {
                layer: 1,
                reason: RejectReason::MissingRow { table: "invert" }
            }
        );
    }

    #[test]
    fn sensitivity_tables() {
        let (map, _) = Map2x2::resolve(&Config::new(&[&[A, B]]));
        assert_eq!(map.sensitivity(0, 0), Some(DEFAULT_SENSITIVITY));

        let config = Config::new(&[&[A, B]]).with_sensitivity(Sensitivity::Global(40));
        let (map, _) = Map2x2::resolve(&config);
        assert_eq!(map.sensitivity(0, 1), Some(40));

        let table: &[&[u16]] = &[&[5, 6], &[7]];
        let config = Config::new(&[&[A, B], &[A, B]]).with_sensitivity(Sensitivity::PerKey(table));
        let (map, report) = Map2x2::resolve(&config);
        assert_eq!(map.sensitivity(0, 1), Some(6));
        assert!(report.is_rejected(1));
    }

    #[test]
    fn channel_order() {
        let config = Config::new(&[&[A, B]]).with_channel_order(&[1, 0]);
        let (map, report) = Map2x2::resolve(&config);
        assert!(report.is_clean());
        assert_eq!(map.physical(0), 1);
        assert_eq!(map.physical(1), 0);
    }

    #[test]
    fn bad_channel_order_falls_back_to_identity() {
        let config = Config::new(&[&[A, B]]).with_channel_order(&[1, 1]);
        let (map, report) = Map2x2::resolve(&config);
        assert_eq!(
            report.channel_order(),
            Some(BootIssue::ChannelOrderInvalid { index: 1 })
        );
        assert_eq!(map.physical(1), 1);

        let config = Config::new(&[&[A, B]]).with_channel_order(&[0]);
        let (_, report) = Map2x2::resolve(&config);
        assert_eq!(
            report.channel_order(),
            Some(BootIssue::ChannelOrderLength {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn report_overflow_is_counted() {
        let rows: [&[Entry]; 12] = [&[A]; 12];
        let (_, report) = Map2x2::resolve(&Config::new(&rows));
        assert_eq!(report.rows().len(), MAX_REPORTED);
        assert_eq!(report.overflow(), 12 - MAX_REPORTED);
    }
}
