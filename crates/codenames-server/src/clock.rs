//! The one-second clock: restart warning, AFK sweep, turn timers.

use chrono::{NaiveDateTime, NaiveTime, Timelike};
use tracing::info;

use codenames_core::protocol::{GameMode, ServerMessage};

use crate::hub::Hub;
use crate::session::SessionId;

/// Daily warning sent to every connection ahead of a scheduled restart.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RestartWarning {
    pub hour: u32,
    pub minute: u32,
    /// Seconds after the minute starts during which the warning may fire.
    pub window_secs: u32,
}

impl RestartWarning {
    /// Parse `HH:MM`.
    pub fn parse(value: &str, window_secs: u32) -> Option<Self> {
        let (hour, minute) = value.trim().split_once(':')?;
        let hour: u32 = hour.parse().ok()?;
        let minute: u32 = minute.parse().ok()?;
        if hour > 23 || minute > 59 {
            return None;
        }
        Some(Self {
            hour,
            minute,
            window_secs,
        })
    }

    pub fn is_due(&self, time: NaiveTime) -> bool {
        time.hour() == self.hour && time.minute() == self.minute && time.second() < self.window_secs
    }
}

impl Hub {
    /// One clock step at local wall-clock time `now`.
    pub fn tick(&mut self, now: NaiveDateTime) {
        self.check_restart_warning(now);
        self.sweep_afk();
        self.sweep_turn_timers();
    }

    fn check_restart_warning(&mut self, now: NaiveDateTime) {
        let Some(warning) = self.config.restart_warning else {
            return;
        };
        let today = now.date();
        if !warning.is_due(now.time()) || self.last_restart_warning == Some(today) {
            return;
        }

        self.last_restart_warning = Some(today);
        self.connections.send_all(&ServerMessage::RestartWarning);
        info!(census = %self.census(), "restart warning sent");
    }

    fn sweep_afk(&mut self) {
        let warning_secs = self.config.afk_warning_secs;
        let mut kicked: Vec<SessionId> = Vec::new();

        for player in self.players.iter_mut() {
            player.afk_timer -= 1;
            if player.afk_timer < warning_secs {
                self.connections.send(&player.session, ServerMessage::AfkWarning);
            }
            if player.afk_timer < 0 {
                self.connections.send(&player.session, ServerMessage::AfkKicked);
                kicked.push(player.session.clone());
            }
        }

        for session in kicked {
            if let Some(player) = self.players.get(&session) {
                info!(
                    census = %self.census(),
                    session = %session,
                    nickname = %player.nickname,
                    room = %player.room,
                    "afk kicked"
                );
            }
            self.leave_room(&session);
        }
    }

    fn sweep_turn_timers(&mut self) {
        let mut expired: Vec<String> = Vec::new();

        for name in self.timed_rooms() {
            let Some(room) = self.rooms.get_mut(&name) else {
                continue;
            };
            room.game.timer -= 1;
            if room.game.timer < 0 {
                room.game.switch_turn(true);
                self.players.clear_proposals(&room.members);
                expired.push(name.clone());
            }

            let timer = room.game.timer;
            for member in &room.members {
                self.connections
                    .send(member, ServerMessage::TimerUpdate { timer });
            }
        }

        for name in expired {
            self.broadcast(&name);
        }
    }

    fn timed_rooms(&self) -> Vec<String> {
        self.rooms
            .iter()
            .filter(|room| room.mode == GameMode::Timed && !room.game.over)
            .map(|room| room.name.clone())
            .collect()
    }
}
