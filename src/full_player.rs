//! Full-length single video player used by the watch screen.

use anyhow::Result;
use tracing::{debug, warn};

use crate::constants::constants;
use crate::media::{Fullscreen, MediaElement, MediaEvent, SeekTarget};
use crate::watchlist::{KeyValueStore, ListKind, WatchListService, WatchStatus};

pub struct FullPlayer<M: MediaElement + Fullscreen> {
  media: M,
  video_id: String,
  pub is_playing: bool,
  pub volume: f32,
  previous_volume: f32,
  pub is_muted: bool,
  /// Fraction of the media played, `0.0..=1.0`.
  pub played: f64,
  pub played_secs: f64,
  pub duration_secs: f64,
  pub is_seeking: bool,
  pub is_buffering: bool,
  pub is_ended: bool,
  pub is_fullscreen: bool,
  pub error: Option<String>,
  pub watch: WatchStatus,
}

impl<M: MediaElement + Fullscreen> FullPlayer<M> {
  /// Mount a player for `video_id`, reading its liked/saved flags.
  pub fn new<S: KeyValueStore>(mut media: M, video_id: &str, watchlist: &WatchListService<S>) -> Self {
    let volume = constants().default_volume;
    media.set_volume(volume);
    media.set_muted(false);
    Self {
      media,
      video_id: video_id.to_string(),
      is_playing: false,
      volume,
      previous_volume: volume,
      is_muted: false,
      played: 0.0,
      played_secs: 0.0,
      duration_secs: 0.0,
      is_seeking: false,
      is_buffering: false,
      is_ended: false,
      is_fullscreen: false,
      error: None,
      watch: watchlist.status(video_id),
    }
  }

  pub fn video_id(&self) -> &str {
    &self.video_id
  }

  pub fn media_mut(&mut self) -> &mut M {
    &mut self.media
  }

  /// Play/pause. Toggling after the end restarts from the beginning.
  pub fn toggle_play(&mut self) {
    if self.is_ended {
      self.is_ended = false;
      self.media.seek_to(SeekTarget::Seconds(0.0));
    }
    self.error = None;
    self.is_playing = !self.is_playing;
    if self.is_playing {
      self.media.play();
    } else {
      self.media.pause();
    }
  }

  /// Mute remembers the volume it replaced; unmute restores it.
  pub fn toggle_mute(&mut self) {
    if self.is_muted {
      self.is_muted = false;
      self.volume = self.previous_volume;
    } else {
      self.previous_volume = self.volume;
      self.is_muted = true;
      self.volume = 0.0;
    }
    self.media.set_muted(self.is_muted);
    self.media.set_volume(self.volume);
  }

  pub fn set_volume(&mut self, volume: f32) {
    self.volume = volume.clamp(0.0, 1.0);
    self.media.set_volume(self.volume);
    if self.volume > 0.0 && self.is_muted {
      self.is_muted = false;
      self.media.set_muted(false);
    } else if self.volume == 0.0 && !self.is_muted {
      self.is_muted = true;
      self.media.set_muted(true);
    }
  }

  pub fn volume_up(&mut self) {
    self.set_volume(self.volume + constants().volume_step);
  }

  pub fn volume_down(&mut self) {
    self.set_volume(self.volume - constants().volume_step);
  }

  /// Jump by `delta` seconds, clamped to the media bounds.
  /// Without a known duration only the start is a bound.
  pub fn skip(&mut self, delta: f64) {
    let target = if self.duration_secs > 0.0 {
      (self.played_secs + delta).clamp(0.0, self.duration_secs)
    } else {
      (self.played_secs + delta).max(0.0)
    };
    self.played_secs = target;
    if self.duration_secs > 0.0 {
      self.played = target / self.duration_secs;
    }
    self.media.seek_to(SeekTarget::Seconds(target));
  }

  pub fn rewind(&mut self) {
    self.skip(-constants().skip_secs);
  }

  pub fn forward(&mut self) {
    self.skip(constants().skip_secs);
  }

  pub fn seek_start(&mut self) {
    self.is_seeking = true;
  }

  pub fn seek_change(&mut self, fraction: f64) {
    self.played = fraction.clamp(0.0, 1.0);
    self.played_secs = self.played * self.duration_secs;
  }

  pub fn seek_end(&mut self, fraction: f64) {
    self.seek_change(fraction);
    self.is_seeking = false;
    self.media.seek_to(SeekTarget::Fraction(self.played));
  }

  /// Ask the platform for fullscreen. State only changes when the request succeeds.
  pub fn toggle_fullscreen(&mut self) -> Result<()> {
    let wanted = !self.is_fullscreen;
    if let Err(e) = self.media.set_fullscreen(wanted) {
      warn!(err = %e, wanted, "player: fullscreen request failed");
      return Err(e);
    }
    self.is_fullscreen = wanted;
    Ok(())
  }

  pub fn toggle_like<S: KeyValueStore>(&mut self, watchlist: &mut WatchListService<S>) -> Result<()> {
    self.watch.liked = watchlist.toggle(ListKind::Liked, &self.video_id)?;
    Ok(())
  }

  pub fn toggle_save<S: KeyValueStore>(&mut self, watchlist: &mut WatchListService<S>) -> Result<()> {
    self.watch.saved = watchlist.toggle(ListKind::Saved, &self.video_id)?;
    Ok(())
  }

  pub fn on_media_event(&mut self, event: MediaEvent) {
    match event {
      MediaEvent::Progress { played_fraction, played_seconds } => {
        if !self.is_seeking {
          self.played = played_fraction;
          self.played_secs = played_seconds;
        }
      }
      MediaEvent::DurationKnown(secs) => self.duration_secs = secs,
      MediaEvent::Ended => {
        debug!(video_id = %self.video_id, "player: ended");
        self.is_playing = false;
        self.is_ended = true;
      }
      MediaEvent::Ready => self.is_buffering = false,
      MediaEvent::Buffering(buffering) => self.is_buffering = buffering,
      MediaEvent::Error(reason) => {
        warn!(video_id = %self.video_id, reason = %reason, "player: playback error");
        self.is_playing = false;
        self.is_buffering = false;
        self.error = Some(reason);
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::media::testing::{MediaCommand, RecordingMedia};
  use crate::watchlist::MemoryStore;

  fn mount() -> (FullPlayer<RecordingMedia>, WatchListService<MemoryStore>) {
    let watchlist = WatchListService::new(MemoryStore::default());
    let mut player = FullPlayer::new(RecordingMedia::default(), "1", &watchlist);
    player.media_mut().take();
    (player, watchlist)
  }

  #[test]
  fn toggle_play_restarts_after_end() {
    let (mut p, _) = mount();
    p.toggle_play();
    p.on_media_event(MediaEvent::Ended);
    assert!(!p.is_playing);
    assert!(p.is_ended);
    p.media_mut().take();
    p.toggle_play();
    assert!(p.is_playing);
    assert_eq!(p.media_mut().take(), [MediaCommand::Seek(SeekTarget::Seconds(0.0)), MediaCommand::Play]);
  }

  #[test]
  fn mute_recalls_previous_volume() {
    let (mut p, _) = mount();
    p.set_volume(0.5);
    p.toggle_mute();
    assert!(p.is_muted);
    assert_eq!(p.volume, 0.0);
    p.toggle_mute();
    assert!(!p.is_muted);
    assert_eq!(p.volume, 0.5);
  }

  #[test]
  fn volume_zero_mutes_and_raise_unmutes() {
    let (mut p, _) = mount();
    p.set_volume(0.0);
    assert!(p.is_muted);
    p.set_volume(0.3);
    assert!(!p.is_muted);
    p.set_volume(7.0);
    assert_eq!(p.volume, 1.0);
  }

  #[test]
  fn skip_is_clamped() {
    let (mut p, _) = mount();
    p.on_media_event(MediaEvent::DurationKnown(25.0));
    p.on_media_event(MediaEvent::Progress { played_fraction: 0.2, played_seconds: 5.0 });
    p.rewind();
    assert_eq!(p.played_secs, 0.0);
    p.forward();
    p.forward();
    p.forward();
    assert_eq!(p.played_secs, 25.0);
    let seeks: Vec<MediaCommand> =
      p.media_mut().take().into_iter().filter(|c| matches!(c, MediaCommand::Seek(_))).collect();
    assert_eq!(seeks.last(), Some(&MediaCommand::Seek(SeekTarget::Seconds(25.0))));
  }

  #[test]
  fn skip_forward_before_duration_is_known() {
    let (mut p, _) = mount();
    p.on_media_event(MediaEvent::Progress { played_fraction: 0.0, played_seconds: 5.0 });
    p.forward();
    assert_eq!(p.played_secs, 15.0);
    assert_eq!(p.media_mut().take(), [MediaCommand::Seek(SeekTarget::Seconds(15.0))]);
    p.rewind();
    p.rewind();
    assert_eq!(p.played_secs, 0.0);
  }

  #[test]
  fn seeking_holds_progress() {
    let (mut p, _) = mount();
    p.on_media_event(MediaEvent::DurationKnown(100.0));
    p.seek_start();
    p.seek_change(0.5);
    p.on_media_event(MediaEvent::Progress { played_fraction: 0.1, played_seconds: 10.0 });
    assert_eq!(p.played, 0.5);
    p.seek_end(0.6);
    assert!(!p.is_seeking);
    assert_eq!(p.media_mut().take(), [MediaCommand::Seek(SeekTarget::Fraction(0.6))]);
  }

  #[test]
  fn fullscreen_state_follows_request_result() {
    let (mut p, _) = mount();
    p.toggle_fullscreen().unwrap();
    assert!(p.is_fullscreen);
    p.media_mut().fail_fullscreen = true;
    assert!(p.toggle_fullscreen().is_err());
    assert!(p.is_fullscreen);
  }

  #[test]
  fn like_and_save_are_persisted() {
    let (mut p, mut watchlist) = mount();
    p.toggle_like(&mut watchlist).unwrap();
    p.toggle_save(&mut watchlist).unwrap();
    assert_eq!(p.watch, WatchStatus { liked: true, saved: true });

    let remounted = FullPlayer::new(RecordingMedia::default(), "1", &watchlist);
    assert_eq!(remounted.watch, WatchStatus { liked: true, saved: true });
    let other = FullPlayer::new(RecordingMedia::default(), "2", &watchlist);
    assert_eq!(other.watch, WatchStatus::default());
  }

  #[test]
  fn error_stops_playback() {
    let (mut p, _) = mount();
    p.toggle_play();
    p.on_media_event(MediaEvent::Error("decoder".into()));
    assert!(!p.is_playing);
    assert_eq!(p.error.as_deref(), Some("decoder"));
  }
}
