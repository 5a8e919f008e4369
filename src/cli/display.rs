//! Display utilities for the Workout Timer CLI.
//!
//! This module provides formatted output for:
//! - Success messages
//! - Error messages
//! - Status display
//! - Exercise list and history tables

use crate::types::{Exercise, HistoryEntry, IpcResponse, Settings};

// ============================================================================
// Display
// ============================================================================

/// Display utilities for CLI output.
pub struct Display;

impl Display {
    /// Shows a success message for session start.
    pub fn show_start_success(response: &IpcResponse) {
        println!("* {}", response.message);

        if let Some(data) = &response.data {
            if let Some(name) = &data.exercise_name {
                println!("  エクササイズ: {}", name);
            }
            if let Some(remaining) = data.seconds_left {
                let (minutes, seconds) = Self::format_time(remaining);
                println!("  残り時間: {}:{:02}", minutes, seconds);
            }
        }
    }

    /// Shows a success message for session pause.
    pub fn show_pause_success(response: &IpcResponse) {
        println!("|| {}", response.message);

        if let Some(data) = &response.data {
            if let Some(remaining) = data.seconds_left {
                let (minutes, seconds) = Self::format_time(remaining);
                println!("  残り時間: {}:{:02}", minutes, seconds);
            }
        }
    }

    /// Shows a success message for session stop.
    pub fn show_stop_success(response: &IpcResponse) {
        println!("[] {}", response.message);
    }

    /// Shows the current session status.
    pub fn show_status(response: &IpcResponse) {
        let Some(data) = &response.data else {
            println!("ステータス情報がありません");
            return;
        };

        let state = data.state.as_deref().unwrap_or("unknown");
        println!("状態: {}", Self::phase_label(state));

        if let Some(name) = &data.exercise_name {
            match state {
                "break" | "paused_break" => println!("次のエクササイズ: {}", name),
                _ => println!("エクササイズ: {}", name),
            }
        }
        if let (Some(index), Some(count)) = (data.exercise_index, data.exercise_count) {
            println!("進捗: {}/{}", index + 1, count);
        }
        if let (Some(remaining), Some(total)) = (data.seconds_left, data.seconds_total) {
            let (rm, rs) = Self::format_time(remaining);
            let (tm, ts) = Self::format_time(total);
            println!("残り時間: {}:{:02} / {}:{:02}", rm, rs, tm, ts);
        }
        if let Some(settings) = &data.settings {
            Self::show_settings(settings);
        }
    }

    /// Shows the exercise list.
    pub fn show_exercises(response: &IpcResponse) {
        let exercises: &[Exercise] = match &response.data {
            Some(data) => data.exercises.as_deref().unwrap_or(&[]),
            None => &[],
        };
        if exercises.is_empty() {
            println!("エクササイズが登録されていません");
            return;
        }

        println!("{}", response.message);
        for exercise in exercises {
            let mark = if exercise.included { "[x]" } else { "[ ]" };
            println!("  {} {:>2}. {}", mark, exercise.id, exercise.name);
        }
    }

    /// Shows the duration configuration.
    pub fn show_durations(response: &IpcResponse) {
        println!("{}", response.message);
        if let Some(data) = &response.data {
            if let Some(settings) = &data.settings {
                Self::show_settings(settings);
            }
        }
    }

    /// Shows the workout history.
    pub fn show_history(response: &IpcResponse) {
        let entries: &[HistoryEntry] = match &response.data {
            Some(data) => data.history.as_deref().unwrap_or(&[]),
            None => &[],
        };
        if entries.is_empty() {
            println!("ワークアウト履歴はまだありません");
            return;
        }

        println!("{}", response.message);
        for entry in entries {
            let (minutes, seconds) = Self::format_time(entry.duration_seconds);
            // RFC 3339 timestamps read fine truncated to the minute.
            let timestamp = entry.completed_at.get(..16).unwrap_or(&entry.completed_at);
            println!(
                "  {}  {}分{:02}秒  {}エクササイズ",
                timestamp.replace('T', " "),
                minutes,
                seconds,
                entry.exercise_count
            );
        }
    }

    /// Shows a generic success message.
    pub fn show_message(response: &IpcResponse) {
        println!("{}", response.message);
    }

    /// Shows an error message.
    pub fn show_error(message: &str) {
        eprintln!("エラー: {}", message);
    }

    /// Prints the duration configuration lines.
    fn show_settings(settings: &Settings) {
        println!("  エクササイズ時間: {}秒", settings.exercise_seconds);
        println!("  休憩時間: {}秒", settings.break_seconds);
    }

    /// Returns the Japanese label for a phase name.
    fn phase_label(state: &str) -> &'static str {
        match state {
            "not_started" => "未開始",
            "in_progress" => "エクササイズ中",
            "break" => "休憩中",
            "paused_training" => "一時停止中 (エクササイズ)",
            "paused_break" => "一時停止中 (休憩)",
            _ => "不明",
        }
    }

    /// Splits seconds into (minutes, seconds).
    fn format_time(total_seconds: u32) -> (u32, u32) {
        (total_seconds / 60, total_seconds % 60)
    }
}

// ============================================================================
// Tests
// ============================================================================
