//! Default end-of-match scoring.

use tracing::{info, warn};

use crate::{Arena, Message, MessageKey, PlayerId, Referee, RewardType, StatKind};

/// Scores a match by kills in that match.
///
/// The alive player with the most [`StatKind::LocalKills`] wins (lowest
/// id on a tie). Alive players get a win or a loss recorded along with
/// the matching reward; every connected member gets the result title.
/// The arena then enters its ending grace period.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardReferee;

impl Referee for StandardReferee {
    fn stop_game(&self, arena: &mut Arena) {
        let hooks = arena.hooks().clone();
        let alive = arena.alive_players();
        let live = arena.live_players();

        let winner = alive
            .iter()
            .map(|p| (*p, arena.stat(*p, StatKind::LocalKills).unwrap_or(0)))
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(&a.0)));

        for player in &alive {
            let player = *player;
            let won = winner.is_some_and(|(w, _)| w == player);
            let (kind, reward) = if won {
                (StatKind::Wins, RewardType::Win)
            } else {
                (StatKind::Loses, RewardType::Lose)
            };
            if let Err(error) = arena.add_stat(player, kind, 1) {
                warn!(arena_id = %arena.id(), %player, %error, "cannot record match result");
            }
            record_highest_score(arena, player);
            if let Err(error) = hooks.rewards.perform_reward(player, reward) {
                warn!(arena_id = %arena.id(), %player, %error, "match result reward failed");
            }
        }

        let subtitle = match winner {
            Some((w, score)) => Message::new(MessageKey::WinnerSubtitle).arg(w).arg(score),
            None => Message::new(MessageKey::WinnerSubtitle),
        };
        for player in &live {
            let title = if winner.is_some_and(|(w, _)| w == *player) {
                Message::new(MessageKey::VictoryTitle)
            } else {
                Message::new(MessageKey::DefeatTitle)
            };
            hooks.notifier.send_title(*player, &title, &subtitle);
        }

        info!(
            arena_id = %arena.id(),
            winner = ?winner.map(|(w, _)| w),
            "match scored"
        );

        let ending_time = arena.settings().ending_time;
        if let Err(error) = arena.begin_ending(ending_time) {
            warn!(arena_id = %arena.id(), %error, "cannot enter ending");
        }
    }
}

fn record_highest_score(arena: &mut Arena, player: PlayerId) {
    let (Some(score), Some(best)) = (
        arena.stat(player, StatKind::LocalKills),
        arena.stat(player, StatKind::HighestScore),
    ) else {
        return;
    };
    if score > best {
        let _ = arena.set_stat(player, StatKind::HighestScore, score);
    }
}
