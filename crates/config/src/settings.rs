// Per-session user settings
// Persisted as a binary blob, see codec.rs for the layout

use std::collections::{BTreeMap, BTreeSet};

use crate::auto_download::AutoDownloadSettings;

/// Default share of the window width taken by the chats list (5/14).
pub const DEFAULT_DIALOGS_WIDTH_RATIO: f64 = 0.357_143;

/// Ratios are kept on the millionths grid the blob stores them on.
pub(crate) const RATIO_SCALE: f64 = 1_000_000.0;

/// Default window for support chat lists: one week, in seconds.
pub const DEFAULT_SUPPORT_CHATS_TIME_SLICE: i32 = 7 * 24 * 60 * 60;

/// Emoji / stickers / GIFs panel tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectorTab {
    #[default]
    Emoji,
    Stickers,
    Gifs,
}

impl SelectorTab {
    pub fn tag(self) -> i32 {
        match self {
            SelectorTab::Emoji => 0,
            SelectorTab::Stickers => 1,
            SelectorTab::Gifs => 2,
        }
    }
}

impl TryFrom<i32> for SelectorTab {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, i32> {
        match tag {
            0 => Ok(SelectorTab::Emoji),
            1 => Ok(SelectorTab::Stickers),
            2 => Ok(SelectorTab::Gifs),
            other => Err(other),
        }
    }
}

/// Window column the floating media player docks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatPlayerColumn {
    First,
    #[default]
    Second,
    Third,
}

impl FloatPlayerColumn {
    pub fn tag(self) -> i32 {
        match self {
            FloatPlayerColumn::First => 0,
            FloatPlayerColumn::Second => 1,
            FloatPlayerColumn::Third => 2,
        }
    }
}

impl TryFrom<i32> for FloatPlayerColumn {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, i32> {
        match tag {
            0 => Ok(FloatPlayerColumn::First),
            1 => Ok(FloatPlayerColumn::Second),
            2 => Ok(FloatPlayerColumn::Third),
            other => Err(other),
        }
    }
}

/// Corner of the column the floating player sticks to.
///
/// Tags are rectangle-part bit flags, so they are not contiguous.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FloatPlayerCorner {
    TopLeft,
    #[default]
    TopRight,
    BottomLeft,
    BottomRight,
}

impl FloatPlayerCorner {
    pub fn tag(self) -> i32 {
        match self {
            FloatPlayerCorner::TopLeft => 1 << 0,
            FloatPlayerCorner::TopRight => 1 << 2,
            FloatPlayerCorner::BottomLeft => 1 << 6,
            FloatPlayerCorner::BottomRight => 1 << 8,
        }
    }
}

impl TryFrom<i32> for FloatPlayerCorner {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, i32> {
        match tag {
            1 => Ok(FloatPlayerCorner::TopLeft),
            4 => Ok(FloatPlayerCorner::TopRight),
            64 => Ok(FloatPlayerCorner::BottomLeft),
            256 => Ok(FloatPlayerCorner::BottomRight),
            other => Err(other),
        }
    }
}

/// How several picked files are sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SendFilesWay {
    #[default]
    Album,
    Photos,
    Files,
}

impl SendFilesWay {
    pub fn tag(self) -> i32 {
        match self {
            SendFilesWay::Album => 0,
            SendFilesWay::Photos => 1,
            SendFilesWay::Files => 2,
        }
    }
}

impl TryFrom<i32> for SendFilesWay {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, i32> {
        match tag {
            0 => Ok(SendFilesWay::Album),
            1 => Ok(SendFilesWay::Photos),
            2 => Ok(SendFilesWay::Files),
            other => Err(other),
        }
    }
}

/// Key combination that sends a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputSubmitWay {
    #[default]
    Enter,
    CtrlEnter,
}

impl InputSubmitWay {
    pub fn tag(self) -> i32 {
        match self {
            InputSubmitWay::Enter => 1,
            InputSubmitWay::CtrlEnter => 2,
        }
    }
}

impl TryFrom<i32> for InputSubmitWay {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, i32> {
        match tag {
            1 => Ok(InputSubmitWay::Enter),
            2 => Ok(InputSubmitWay::CtrlEnter),
            other => Err(other),
        }
    }
}

/// Where support mode jumps after a reply is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SupportSwitch {
    None,
    #[default]
    Next,
    Previous,
}

impl SupportSwitch {
    pub fn tag(self) -> i32 {
        match self {
            SupportSwitch::None => 0,
            SupportSwitch::Next => 1,
            SupportSwitch::Previous => 2,
        }
    }
}

impl TryFrom<i32> for SupportSwitch {
    type Error = i32;

    fn try_from(tag: i32) -> Result<Self, i32> {
        match tag {
            0 => Ok(SupportSwitch::None),
            1 => Ok(SupportSwitch::Next),
            2 => Ok(SupportSwitch::Previous),
            other => Err(other),
        }
    }
}

/// Settings owned by one logged-in session.
///
/// Fields are only writable through the setters below so the rules that tie
/// fields together (info panel vs. tabbed selector) cannot be bypassed.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsRecord {
    // Chat helpers
    pub(crate) selector_tab: SelectorTab,
    pub(crate) last_seen_warning_seen: bool,
    pub(crate) tabbed_selector_section_enabled: bool,
    pub(crate) tabbed_selector_section_tooltip_shown: i32,
    pub(crate) group_stickers_section_hidden: BTreeSet<u64>,

    // Notifications
    pub(crate) sound_overrides: BTreeMap<String, String>,
    pub(crate) include_muted_counter: bool,
    pub(crate) count_unread_messages: bool,
    pub(crate) notify_about_pinned: bool,

    // Layout
    pub(crate) float_player_column: FloatPlayerColumn,
    pub(crate) float_player_corner: FloatPlayerCorner,
    pub(crate) third_section_info_enabled: bool,
    pub(crate) small_dialogs_list: bool,
    pub(crate) dialogs_width_ratio: f64,
    pub(crate) third_column_width: i32,
    pub(crate) third_section_extended_by: i32,
    pub(crate) archive_collapsed: bool,

    // Sending
    pub(crate) send_files_way: SendFilesWay,
    pub(crate) send_submit_way: InputSubmitWay,
    pub(crate) exe_launch_warning: bool,
    pub(crate) auto_download: AutoDownloadSettings,

    // Support mode
    pub(crate) support_switch: SupportSwitch,
    pub(crate) support_fix_chats_order: bool,
    pub(crate) support_templates_autocomplete: bool,
    pub(crate) support_chats_time_slice: i32,
    pub(crate) support_all_search_results: bool,

    // Runtime only, never persisted
    pub(crate) tabbed_replaced_with_info: bool,
}

impl Default for SettingsRecord {
    fn default() -> Self {
        Self {
            selector_tab: SelectorTab::default(),
            last_seen_warning_seen: false,
            tabbed_selector_section_enabled: true,
            tabbed_selector_section_tooltip_shown: 0,
            group_stickers_section_hidden: BTreeSet::new(),
            sound_overrides: BTreeMap::new(),
            include_muted_counter: true,
            count_unread_messages: true,
            notify_about_pinned: true,
            float_player_column: FloatPlayerColumn::default(),
            float_player_corner: FloatPlayerCorner::default(),
            third_section_info_enabled: false,
            small_dialogs_list: false,
            dialogs_width_ratio: DEFAULT_DIALOGS_WIDTH_RATIO,
            third_column_width: 0,
            third_section_extended_by: -1, // -1 = not extended
            archive_collapsed: false,
            send_files_way: SendFilesWay::default(),
            send_submit_way: InputSubmitWay::default(),
            exe_launch_warning: true,
            auto_download: AutoDownloadSettings::default(),
            support_switch: SupportSwitch::default(),
            support_fix_chats_order: true,
            support_templates_autocomplete: true,
            support_chats_time_slice: DEFAULT_SUPPORT_CHATS_TIME_SLICE,
            support_all_search_results: false,
            tabbed_replaced_with_info: false,
        }
    }
}

impl SettingsRecord {
    pub fn selector_tab(&self) -> SelectorTab {
        self.selector_tab
    }

    pub fn set_selector_tab(&mut self, tab: SelectorTab) {
        self.selector_tab = tab;
    }

    pub fn last_seen_warning_seen(&self) -> bool {
        self.last_seen_warning_seen
    }

    pub fn set_last_seen_warning_seen(&mut self, seen: bool) {
        self.last_seen_warning_seen = seen;
    }

    pub fn tabbed_selector_section_enabled(&self) -> bool {
        self.tabbed_selector_section_enabled
    }

    /// Enabling the tabbed selector section hides the info section.
    pub fn set_tabbed_selector_section_enabled(&mut self, enabled: bool) {
        self.tabbed_selector_section_enabled = enabled;
        if enabled {
            self.set_third_section_info_enabled(false);
        }
        self.tabbed_replaced_with_info = false;
    }

    pub fn tabbed_selector_section_tooltip_shown(&self) -> i32 {
        self.tabbed_selector_section_tooltip_shown
    }

    pub fn set_tabbed_selector_section_tooltip_shown(&mut self, shown: i32) {
        self.tabbed_selector_section_tooltip_shown = shown;
    }

    pub fn third_section_info_enabled(&self) -> bool {
        self.third_section_info_enabled
    }

    /// Enabling the info section hides the tabbed selector section.
    pub fn set_third_section_info_enabled(&mut self, enabled: bool) {
        if self.third_section_info_enabled == enabled {
            return;
        }
        self.third_section_info_enabled = enabled;
        if enabled {
            self.tabbed_selector_section_enabled = false;
        }
        self.tabbed_replaced_with_info = false;
    }

    /// Whether the info section is temporarily shown in place of the
    /// tabbed selector. Not persisted.
    pub fn tabbed_replaced_with_info(&self) -> bool {
        self.tabbed_replaced_with_info
    }

    pub fn set_tabbed_replaced_with_info(&mut self, replaced: bool) {
        self.tabbed_replaced_with_info = replaced;
    }

    pub fn sound_overrides(&self) -> &BTreeMap<String, String> {
        &self.sound_overrides
    }

    pub fn set_sound_override(&mut self, key: impl Into<String>, path: impl Into<String>) {
        self.sound_overrides.insert(key.into(), path.into());
    }

    pub fn clear_sound_overrides(&mut self) {
        self.sound_overrides.clear();
    }

    /// Path of the sound played for `key`: the user's override, or the
    /// bundled resource.
    pub fn sound_path(&self, key: &str) -> String {
        match self.sound_overrides.get(key) {
            Some(path) => path.clone(),
            None => format!(":/sounds/{}.mp3", key),
        }
    }

    pub fn float_player_column(&self) -> FloatPlayerColumn {
        self.float_player_column
    }

    pub fn set_float_player_column(&mut self, column: FloatPlayerColumn) {
        self.float_player_column = column;
    }

    pub fn float_player_corner(&self) -> FloatPlayerCorner {
        self.float_player_corner
    }

    pub fn set_float_player_corner(&mut self, corner: FloatPlayerCorner) {
        self.float_player_corner = corner;
    }

    pub fn group_stickers_section_hidden(&self) -> &BTreeSet<u64> {
        &self.group_stickers_section_hidden
    }

    pub fn is_group_stickers_section_hidden(&self, peer_id: u64) -> bool {
        self.group_stickers_section_hidden.contains(&peer_id)
    }

    pub fn set_group_stickers_section_hidden(&mut self, peer_id: u64) {
        self.group_stickers_section_hidden.insert(peer_id);
    }

    pub fn remove_group_stickers_section_hidden(&mut self, peer_id: u64) {
        self.group_stickers_section_hidden.remove(&peer_id);
    }

    pub fn small_dialogs_list(&self) -> bool {
        self.small_dialogs_list
    }

    pub fn set_small_dialogs_list(&mut self, small: bool) {
        self.small_dialogs_list = small;
    }

    pub fn dialogs_width_ratio(&self) -> f64 {
        self.dialogs_width_ratio
    }

    /// Stored clamped to [0, 1] and rounded to millionths.
    pub fn set_dialogs_width_ratio(&mut self, ratio: f64) {
        self.dialogs_width_ratio = if ratio.is_nan() {
            0.0
        } else {
            (ratio.clamp(0.0, 1.0) * RATIO_SCALE).round() / RATIO_SCALE
        };
    }

    pub fn third_column_width(&self) -> i32 {
        self.third_column_width
    }

    pub fn set_third_column_width(&mut self, width: i32) {
        self.third_column_width = width;
    }

    pub fn third_section_extended_by(&self) -> i32 {
        self.third_section_extended_by
    }

    pub fn set_third_section_extended_by(&mut self, by: i32) {
        self.third_section_extended_by = by;
    }

    pub fn send_files_way(&self) -> SendFilesWay {
        self.send_files_way
    }

    pub fn set_send_files_way(&mut self, way: SendFilesWay) {
        self.send_files_way = way;
    }

    pub fn send_submit_way(&self) -> InputSubmitWay {
        self.send_submit_way
    }

    pub fn set_send_submit_way(&mut self, way: InputSubmitWay) {
        self.send_submit_way = way;
    }

    pub fn support_switch(&self) -> SupportSwitch {
        self.support_switch
    }

    pub fn set_support_switch(&mut self, switch: SupportSwitch) {
        self.support_switch = switch;
    }

    pub fn support_fix_chats_order(&self) -> bool {
        self.support_fix_chats_order
    }

    pub fn set_support_fix_chats_order(&mut self, fix: bool) {
        self.support_fix_chats_order = fix;
    }

    pub fn support_templates_autocomplete(&self) -> bool {
        self.support_templates_autocomplete
    }

    pub fn set_support_templates_autocomplete(&mut self, enabled: bool) {
        self.support_templates_autocomplete = enabled;
    }

    /// Seconds of history shown in support chat lists.
    pub fn support_chats_time_slice(&self) -> i32 {
        self.support_chats_time_slice
    }

    pub fn set_support_chats_time_slice(&mut self, slice: i32) {
        self.support_chats_time_slice = slice;
    }

    pub fn support_all_search_results(&self) -> bool {
        self.support_all_search_results
    }

    pub fn set_support_all_search_results(&mut self, all: bool) {
        self.support_all_search_results = all;
    }

    pub fn include_muted_counter(&self) -> bool {
        self.include_muted_counter
    }

    pub fn set_include_muted_counter(&mut self, include: bool) {
        self.include_muted_counter = include;
    }

    pub fn count_unread_messages(&self) -> bool {
        self.count_unread_messages
    }

    pub fn set_count_unread_messages(&mut self, count: bool) {
        self.count_unread_messages = count;
    }

    pub fn exe_launch_warning(&self) -> bool {
        self.exe_launch_warning
    }

    pub fn set_exe_launch_warning(&mut self, warning: bool) {
        self.exe_launch_warning = warning;
    }

    pub fn auto_download(&self) -> &AutoDownloadSettings {
        &self.auto_download
    }

    pub fn auto_download_mut(&mut self) -> &mut AutoDownloadSettings {
        &mut self.auto_download
    }

    pub fn archive_collapsed(&self) -> bool {
        self.archive_collapsed
    }

    pub fn set_archive_collapsed(&mut self, collapsed: bool) {
        self.archive_collapsed = collapsed;
    }

    pub fn notify_about_pinned(&self) -> bool {
        self.notify_about_pinned
    }

    pub fn set_notify_about_pinned(&mut self, notify: bool) {
        self.notify_about_pinned = notify;
    }
}
