//! Binary codec for [`SettingsRecord`].
//!
//! # Layout
//!
//! The blob is a fixed sequence of field groups, little-endian:
//!
//! | # | group |
//! |---|---|
//! | 1 | selector tab |
//! | 2 | last-seen warning seen |
//! | 3 | tabbed selector section enabled |
//! | 4 | sound overrides: count, then (key, path) pairs |
//! | 5 | tabbed selector tooltip shown counter |
//! | 6 | float player column, corner |
//! | 7 | hidden group sticker sections: count, then peer ids |
//! | 8 | info section enabled, small dialogs list |
//! | 9 | dialogs width ratio (x 1e6), third column width, third section extension |
//! | 10 | send files way |
//! | 11 | legacy peer-to-peer calls privacy (written as 0) |
//! | 12 | submit way, support switch, support fix chats order |
//! | 13 | support templates autocomplete |
//! | 14 | support chats time slice |
//! | 15 | include muted counter, count unread messages |
//! | 16 | executable launch warning |
//! | 17 | auto-download sub-blob (length prefixed) |
//! | 18 | support all search results |
//! | 19 | archive collapsed |
//! | 20 | notify about pinned |
//!
//! There is no version tag. Groups are only ever appended, so a blob from
//! an older build is a prefix of the current layout and decoding stops
//! cleanly when the stream runs out between groups. New fields go at the
//! end, never in between.

use parley_protocol::{StreamError, StreamReader, StreamWriter};

use crate::error::DecodeError;
use crate::settings::SettingsRecord;

/// Number of field groups written by [`encode`].
pub const GROUP_COUNT: usize = 20;

/// Legacy peer-to-peer calls privacy value meaning "nobody".
pub const LEGACY_CALLS_PEER_TO_PEER_NOBODY: i32 = 4;

/// Fixed-point scale of the dialogs width ratio.
const RATIO_SCALE: i32 = 1_000_000;

/// Facts about the blob that are not kept in the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeNotes {
    /// The blob still carried the retired "nobody" peer-to-peer calls
    /// privacy value. The session should push that choice to the server
    /// once and then forget it.
    pub legacy_calls_peer_to_peer_nobody: bool,
}

/// A successfully decoded blob.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub record: SettingsRecord,
    pub notes: DecodeNotes,
}

/// Encode every persisted field of `record`.
pub fn encode(record: &SettingsRecord) -> Vec<u8> {
    write_groups(record).0
}

/// Byte offsets where each of the [`GROUP_COUNT`] groups of `encode(record)`
/// ends. Truncating the blob at one of these offsets gives exactly what an
/// older build that stopped at that group would have written.
pub fn field_group_ends(record: &SettingsRecord) -> Vec<usize> {
    write_groups(record).1
}

/// Decode a blob on top of `prior`.
///
/// Fields missing from a shorter (older) blob take their defaults.
/// Unknown enum tags keep the value from `prior`. On error nothing is
/// returned, so the caller's record stays as it was.
pub fn decode(serialized: &[u8], prior: &SettingsRecord) -> Result<Decoded, DecodeError> {
    if serialized.is_empty() {
        return Ok(Decoded {
            record: prior.clone(),
            notes: DecodeNotes::default(),
        });
    }

    let result = read_record(serialized, prior);
    if let Err(err) = &result {
        log::error!("Bad data for session settings ({} bytes): {}", serialized.len(), err);
    }
    result
}

impl SettingsRecord {
    pub fn serialize(&self) -> Vec<u8> {
        encode(self)
    }

    /// Replace this record with the contents of `serialized`.
    ///
    /// All or nothing: on error `self` is unchanged.
    pub fn apply_serialized(&mut self, serialized: &[u8]) -> Result<DecodeNotes, DecodeError> {
        let decoded = decode(serialized, self)?;
        *self = decoded.record;
        Ok(decoded.notes)
    }
}

fn write_groups(record: &SettingsRecord) -> (Vec<u8>, Vec<usize>) {
    let auto_download = record.auto_download.serialize();
    let strings: usize = record
        .sound_overrides
        .iter()
        .map(|(key, path)| 8 + key.len() + path.len())
        .sum();
    let capacity = 23 * 4
        + 2 * 4
        + strings
        + record.group_stickers_section_hidden.len() * 8
        + 4
        + auto_download.len();

    let mut w = StreamWriter::with_capacity(capacity);
    let mut ends = Vec::with_capacity(GROUP_COUNT);

    w.write_i32(record.selector_tab.tag());
    ends.push(w.len());

    w.write_bool(record.last_seen_warning_seen);
    ends.push(w.len());

    w.write_bool(record.tabbed_selector_section_enabled);
    ends.push(w.len());

    w.write_count(record.sound_overrides.len());
    for (key, path) in &record.sound_overrides {
        w.write_string(key);
        w.write_string(path);
    }
    ends.push(w.len());

    w.write_i32(record.tabbed_selector_section_tooltip_shown);
    ends.push(w.len());

    w.write_i32(record.float_player_column.tag());
    w.write_i32(record.float_player_corner.tag());
    ends.push(w.len());

    w.write_count(record.group_stickers_section_hidden.len());
    for &peer_id in &record.group_stickers_section_hidden {
        w.write_u64(peer_id);
    }
    ends.push(w.len());

    w.write_bool(record.third_section_info_enabled);
    w.write_bool(record.small_dialogs_list);
    ends.push(w.len());

    w.write_i32(ratio_to_fixed(record.dialogs_width_ratio));
    w.write_i32(record.third_column_width);
    w.write_i32(record.third_section_extended_by);
    ends.push(w.len());

    w.write_i32(record.send_files_way.tag());
    ends.push(w.len());

    w.write_i32(0); // legacy calls peer-to-peer
    ends.push(w.len());

    w.write_i32(record.send_submit_way.tag());
    w.write_i32(record.support_switch.tag());
    w.write_bool(record.support_fix_chats_order);
    ends.push(w.len());

    w.write_bool(record.support_templates_autocomplete);
    ends.push(w.len());

    w.write_i32(record.support_chats_time_slice);
    ends.push(w.len());

    w.write_bool(record.include_muted_counter);
    w.write_bool(record.count_unread_messages);
    ends.push(w.len());

    w.write_bool(record.exe_launch_warning);
    ends.push(w.len());

    w.write_bytes(&auto_download);
    ends.push(w.len());

    w.write_bool(record.support_all_search_results);
    ends.push(w.len());

    w.write_bool(record.archive_collapsed);
    ends.push(w.len());

    w.write_bool(record.notify_about_pinned);
    ends.push(w.len());

    debug_assert_eq!(ends.len(), GROUP_COUNT);
    (w.into_bytes(), ends)
}

fn read_record(serialized: &[u8], prior: &SettingsRecord) -> Result<Decoded, DecodeError> {
    let mut reader = StreamReader::new(serialized);
    let mut record = SettingsRecord {
        tabbed_replaced_with_info: prior.tabbed_replaced_with_info,
        ..SettingsRecord::default()
    };
    let mut legacy_calls_peer_to_peer = 0;
    let mut auto_download: &[u8] = &[];

    read_groups(
        &mut reader,
        &mut record,
        prior,
        &mut legacy_calls_peer_to_peer,
        &mut auto_download,
    )?;

    if !auto_download.is_empty() {
        record.auto_download.set_from_serialized(auto_download)?;
    }
    if record.third_section_info_enabled {
        record.tabbed_selector_section_enabled = false;
    }

    log::debug!(
        "Decoded session settings: {} of {} bytes",
        reader.position(),
        serialized.len()
    );
    Ok(Decoded {
        record,
        notes: DecodeNotes {
            legacy_calls_peer_to_peer_nobody: legacy_calls_peer_to_peer
                == LEGACY_CALLS_PEER_TO_PEER_NOBODY,
        },
    })
}

/// Reads groups into `out` until the stream runs out between groups.
fn read_groups<'a>(
    r: &mut StreamReader<'a>,
    out: &mut SettingsRecord,
    prior: &SettingsRecord,
    legacy_calls_peer_to_peer: &mut i32,
    auto_download: &mut &'a [u8],
) -> Result<(), StreamError> {
    if r.at_end() {
        return Ok(());
    }
    out.selector_tab = read_tag(r, prior.selector_tab)?;

    if r.at_end() {
        return Ok(());
    }
    out.last_seen_warning_seen = r.read_bool()?;

    if r.at_end() {
        return Ok(());
    }
    out.tabbed_selector_section_enabled = r.read_bool()?;

    if r.at_end() {
        return Ok(());
    }
    let count = r.read_count()?;
    for _ in 0..count {
        let key = r.read_string()?;
        let path = r.read_string()?;
        out.sound_overrides.insert(key, path);
    }

    if r.at_end() {
        return Ok(());
    }
    out.tabbed_selector_section_tooltip_shown = r.read_i32()?;

    if r.at_end() {
        return Ok(());
    }
    out.float_player_column = read_tag(r, prior.float_player_column)?;
    out.float_player_corner = read_tag(r, prior.float_player_corner)?;

    if r.at_end() {
        return Ok(());
    }
    let count = r.read_count()?;
    for _ in 0..count {
        out.group_stickers_section_hidden.insert(r.read_u64()?);
    }

    if r.at_end() {
        return Ok(());
    }
    out.third_section_info_enabled = r.read_bool()?;
    out.small_dialogs_list = r.read_bool()?;

    if r.at_end() {
        return Ok(());
    }
    out.dialogs_width_ratio = ratio_from_fixed(r.read_i32()?);
    out.third_column_width = r.read_i32()?;
    out.third_section_extended_by = r.read_i32()?;

    if r.at_end() {
        return Ok(());
    }
    out.send_files_way = read_tag(r, prior.send_files_way)?;

    if r.at_end() {
        return Ok(());
    }
    *legacy_calls_peer_to_peer = r.read_i32()?;

    if r.at_end() {
        return Ok(());
    }
    out.send_submit_way = read_tag(r, prior.send_submit_way)?;
    out.support_switch = read_tag(r, prior.support_switch)?;
    out.support_fix_chats_order = r.read_bool()?;

    if r.at_end() {
        return Ok(());
    }
    out.support_templates_autocomplete = r.read_bool()?;

    if r.at_end() {
        return Ok(());
    }
    out.support_chats_time_slice = r.read_i32()?;

    if r.at_end() {
        return Ok(());
    }
    out.include_muted_counter = r.read_bool()?;
    out.count_unread_messages = r.read_bool()?;

    if r.at_end() {
        return Ok(());
    }
    out.exe_launch_warning = r.read_bool()?;

    if r.at_end() {
        return Ok(());
    }
    *auto_download = r.read_bytes()?;

    if r.at_end() {
        return Ok(());
    }
    out.support_all_search_results = r.read_bool()?;

    if r.at_end() {
        return Ok(());
    }
    out.archive_collapsed = r.read_bool()?;

    if r.at_end() {
        return Ok(());
    }
    out.notify_about_pinned = r.read_bool()?;

    if !r.at_end() {
        log::debug!("Ignoring {} trailing bytes in session settings", r.remaining());
    }
    Ok(())
}

/// Reads an enum tag; a tag outside the known set keeps `prior`.
fn read_tag<T>(r: &mut StreamReader<'_>, prior: T) -> Result<T, StreamError>
where
    T: TryFrom<i32, Error = i32> + std::fmt::Debug,
{
    let tag = r.read_i32()?;
    Ok(T::try_from(tag).unwrap_or_else(|unknown| {
        log::warn!("Unknown settings tag {}, keeping {:?}", unknown, prior);
        prior
    }))
}

fn ratio_to_fixed(ratio: f64) -> i32 {
    // `as` saturates and maps NaN to 0
    ((ratio * f64::from(RATIO_SCALE)).round() as i32).clamp(0, RATIO_SCALE)
}

fn ratio_from_fixed(value: i32) -> f64 {
    (f64::from(value) / f64::from(RATIO_SCALE)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auto_download::{MediaKind, MediaSource};
    use crate::error::AutoDownloadError;
    use crate::settings::{
        FloatPlayerColumn, FloatPlayerCorner, InputSubmitWay, SelectorTab, SendFilesWay,
        SupportSwitch,
    };

    fn sample() -> SettingsRecord {
        let mut s = SettingsRecord::default();
        s.set_selector_tab(SelectorTab::Gifs);
        s.set_last_seen_warning_seen(true);
        s.set_sound_override("msg_incoming", "/home/me/ding.wav");
        s.set_sound_override("call_end", "/home/me/bye.ogg");
        s.set_tabbed_selector_section_tooltip_shown(3);
        s.set_float_player_column(FloatPlayerColumn::Third);
        s.set_float_player_corner(FloatPlayerCorner::BottomLeft);
        s.set_group_stickers_section_hidden(42);
        s.set_group_stickers_section_hidden(u64::MAX);
        s.set_third_section_info_enabled(true);
        s.set_small_dialogs_list(true);
        s.set_dialogs_width_ratio(0.25);
        s.set_third_column_width(320);
        s.set_third_section_extended_by(80);
        s.set_send_files_way(SendFilesWay::Files);
        s.set_send_submit_way(InputSubmitWay::CtrlEnter);
        s.set_support_switch(SupportSwitch::Previous);
        s.set_support_fix_chats_order(false);
        s.set_support_templates_autocomplete(false);
        s.set_support_chats_time_slice(3600);
        s.set_include_muted_counter(false);
        s.set_count_unread_messages(false);
        s.set_exe_launch_warning(false);
        s.auto_download_mut()
            .set_bytes_limit(MediaSource::Channel, MediaKind::File, 2048);
        s.set_support_all_search_results(true);
        s.set_archive_collapsed(true);
        s.set_notify_about_pinned(false);
        s
    }

    fn patch_i32(blob: &mut [u8], offset: usize, value: i32) {
        blob[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
    }

    #[test]
    fn test_round_trip_default() {
        let record = SettingsRecord::default();
        let decoded = decode(&encode(&record), &record).unwrap();
        assert_eq!(decoded.record, record);
    }

    #[test]
    fn test_round_trip_off_grid_ratio() {
        for ratio in [1.0 / 3.0, 0.999_999_9, 0.000_000_4, 5.0 / 14.0] {
            let mut record = sample();
            record.set_dialogs_width_ratio(ratio);
            let decoded = decode(&encode(&record), &SettingsRecord::default()).unwrap();
            assert_eq!(decoded.record, record, "ratio {}", ratio);
        }
    }

    #[test]
    fn test_round_trip_sample() {
        let record = sample();
        let decoded = decode(&encode(&record), &SettingsRecord::default()).unwrap();
        assert_eq!(decoded.record, record);
        assert!(!decoded.notes.legacy_calls_peer_to_peer_nobody);
    }

    #[test]
    fn test_layout_prefix() {
        let blob = encode(&SettingsRecord::default());
        // selector tab, last seen warning, tabbed selector, empty sound map
        assert_eq!(&blob[..16], &[0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(*field_group_ends(&SettingsRecord::default()).last().unwrap(), blob.len());
    }

    #[test]
    fn test_group_ends_cover_every_group() {
        let ends = field_group_ends(&sample());
        assert_eq!(ends.len(), GROUP_COUNT);
        assert!(ends.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_empty_blob_keeps_prior() {
        let prior = sample();
        let decoded = decode(&[], &prior).unwrap();
        assert_eq!(decoded.record, prior);
    }

    #[test]
    fn test_old_blob_fills_defaults() {
        let record = sample();
        let ends = field_group_ends(&record);
        let blob = encode(&record);

        // A build that only knew about the first nine groups
        let decoded = decode(&blob[..ends[8]], &record).unwrap().record;
        assert_eq!(decoded.dialogs_width_ratio(), 0.25);
        assert_eq!(decoded.third_column_width(), 320);
        assert_eq!(decoded.send_files_way(), SendFilesWay::default());
        assert!(decoded.notify_about_pinned());
        assert_eq!(decoded.auto_download(), SettingsRecord::default().auto_download());
    }

    #[test]
    fn test_truncated_mid_field_fails_without_touching_record() {
        let record = sample();
        let blob = encode(&record);
        for end in field_group_ends(&record) {
            let mut target = sample();
            target.set_selector_tab(SelectorTab::Stickers);
            let before = target.clone();

            let result = target.apply_serialized(&blob[..end - 2]);
            assert!(matches!(result, Err(DecodeError::Stream(_))), "cut at {}", end - 2);
            assert_eq!(target, before);
        }
    }

    #[test]
    fn test_unknown_selector_tab_keeps_prior_value() {
        let mut blob = encode(&sample());
        patch_i32(&mut blob, 0, 7);

        let mut prior = SettingsRecord::default();
        prior.set_selector_tab(SelectorTab::Stickers);
        let decoded = decode(&blob, &prior).unwrap().record;
        assert_eq!(decoded.selector_tab(), SelectorTab::Stickers);
        // Everything else still decoded
        assert_eq!(decoded.float_player_column(), FloatPlayerColumn::Third);
    }

    #[test]
    fn test_unknown_corner_keeps_prior_value() {
        let record = sample();
        let ends = field_group_ends(&record);
        let mut blob = encode(&record);
        patch_i32(&mut blob, ends[4] + 4, 2);

        let decoded = decode(&blob, &SettingsRecord::default()).unwrap().record;
        assert_eq!(decoded.float_player_corner(), FloatPlayerCorner::TopRight);
        assert_eq!(decoded.float_player_column(), FloatPlayerColumn::Third);
    }

    #[test]
    fn test_ratio_is_clamped_on_decode() {
        let record = sample();
        let ends = field_group_ends(&record);
        let mut blob = encode(&record);

        patch_i32(&mut blob, ends[7], 1_500_000);
        assert_eq!(decode(&blob, &record).unwrap().record.dialogs_width_ratio(), 1.0);

        patch_i32(&mut blob, ends[7], -250_000);
        assert_eq!(decode(&blob, &record).unwrap().record.dialogs_width_ratio(), 0.0);
    }

    #[test]
    fn test_ratio_fixed_point() {
        assert_eq!(ratio_to_fixed(0.5), 500_000);
        assert_eq!(ratio_to_fixed(1.2), 1_000_000);
        assert_eq!(ratio_to_fixed(-1.0), 0);
        assert_eq!(ratio_to_fixed(f64::NAN), 0);
        assert_eq!(ratio_from_fixed(250_000), 0.25);
    }

    #[test]
    fn test_info_section_forces_tabbed_selector_off() {
        let record = SettingsRecord::default();
        let ends = field_group_ends(&record);
        let mut blob = encode(&record);
        patch_i32(&mut blob, ends[1], 1); // tabbed selector
        patch_i32(&mut blob, ends[6], 1); // info section

        let decoded = decode(&blob, &record).unwrap().record;
        assert!(decoded.third_section_info_enabled());
        assert!(!decoded.tabbed_selector_section_enabled());
    }

    #[test]
    fn test_legacy_calls_sentinel_is_reported() {
        let record = sample();
        let ends = field_group_ends(&record);
        let mut blob = encode(&record);
        patch_i32(&mut blob, ends[9], LEGACY_CALLS_PEER_TO_PEER_NOBODY);

        let decoded = decode(&blob, &SettingsRecord::default()).unwrap();
        assert!(decoded.notes.legacy_calls_peer_to_peer_nobody);
        assert_eq!(decoded.record, record);
        // Re-encoding drops the legacy value
        assert_eq!(&encode(&decoded.record)[ends[9]..ends[10]], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_other_legacy_values_are_ignored() {
        let record = sample();
        let ends = field_group_ends(&record);
        let mut blob = encode(&record);
        patch_i32(&mut blob, ends[9], 2);
        assert!(!decode(&blob, &record).unwrap().notes.legacy_calls_peer_to_peer_nobody);
    }

    #[test]
    fn test_bad_auto_download_blob_fails_whole_decode() {
        let record = sample();
        let ends = field_group_ends(&record);
        let mut blob = encode(&record);
        // Version byte follows the sub-blob length prefix
        blob[ends[15] + 4] = 9;

        let mut target = SettingsRecord::default();
        let result = target.apply_serialized(&blob);
        assert_eq!(
            result,
            Err(DecodeError::AutoDownload(AutoDownloadError::Version {
                found: 9,
                expected: 1
            }))
        );
        assert_eq!(target, SettingsRecord::default());
    }

    #[test]
    fn test_empty_auto_download_blob_keeps_defaults() {
        let record = sample();
        let ends = field_group_ends(&record);
        let blob = encode(&record);

        let mut old = blob[..ends[15]].to_vec();
        old.extend_from_slice(&0i32.to_le_bytes());
        let decoded = decode(&old, &record).unwrap().record;
        assert_eq!(decoded.auto_download(), SettingsRecord::default().auto_download());
        assert!(!decoded.exe_launch_warning());
    }

    #[test]
    fn test_negative_count_fails() {
        let record = SettingsRecord::default();
        let ends = field_group_ends(&record);
        let mut blob = encode(&record);
        patch_i32(&mut blob, ends[2], -3);

        let result = decode(&blob, &record);
        assert!(matches!(
            result,
            Err(DecodeError::Stream(StreamError::NegativeLength { length: -3, .. }))
        ));
    }

    #[test]
    fn test_runtime_only_flag_comes_from_prior() {
        let mut prior = SettingsRecord::default();
        prior.set_tabbed_replaced_with_info(true);
        let decoded = decode(&encode(&SettingsRecord::default()), &prior).unwrap().record;
        assert!(decoded.tabbed_replaced_with_info());
    }
}
