//! Per-entity playback: animation library, FIFO queue, hold/freeze and the tick driver.
//!
//! Methods:
//! - library: add_animation, add_shared, remove_animation_by_name, get_animation
//! - queue: append_queue, queue_by_name, override_queue, override_by_name, clear_queue, play_now
//! - tick: hold_current, animate, animate_default, drain_events

use std::collections::VecDeque;
use std::rc::Rc;

use hashbrown::HashMap;
use image::RgbaImage;

use crate::config::Config;
use crate::error::SpriteError;
use crate::outputs::{EventLog, HandlerEvent, StartSource};
use crate::sequence::{AnimationSequence, SequenceHandle};
use crate::Result;

/// A sequence paired with the scale it should be drawn at.
#[derive(Clone, Debug)]
pub struct PlaybackEntry {
    pub sequence: SequenceHandle,
    pub scale: u32,
}

impl PlaybackEntry {
    pub fn new(sequence: SequenceHandle, scale: u32) -> Result<Self> {
        if scale == 0 {
            return Err(SpriteError::invalid("scale must be at least 1"));
        }
        Ok(Self { sequence, scale })
    }

    /// Name of the referenced sequence.
    pub fn name(&self) -> String {
        self.sequence.borrow().name().to_string()
    }

    /// Same sequence (by identity) at the same scale.
    pub fn same_as(&self, other: &PlaybackEntry) -> bool {
        Rc::ptr_eq(&self.sequence, &other.sequence) && self.scale == other.scale
    }
}

/// Name-keyed animation library. Each handler owns its own.
#[derive(Default, Debug)]
struct SequenceLib {
    items: HashMap<String, SequenceHandle>,
}

impl SequenceLib {
    fn insert(&mut self, handle: SequenceHandle) -> Result<()> {
        let name = handle.borrow().name().to_string();
        if self.items.contains_key(&name) {
            return Err(SpriteError::DuplicateName { name });
        }
        self.items.insert(name, handle);
        Ok(())
    }

    fn get(&self, name: &str) -> Result<SequenceHandle> {
        self.items
            .get(name)
            .cloned()
            .ok_or_else(|| SpriteError::not_found(name))
    }

    fn remove(&mut self, name: &str) -> Result<SequenceHandle> {
        self.items
            .remove(name)
            .ok_or_else(|| SpriteError::not_found(name))
    }
}

/// Playback state machine for one animated entity.
#[derive(Debug)]
pub struct AnimationHandler {
    cfg: Config,
    library: SequenceLib,
    queue: VecDeque<PlaybackEntry>,
    current: PlaybackEntry,
    default: PlaybackEntry,
    is_held: bool,
    hold_remaining: u32,
    events: EventLog,
}

impl AnimationHandler {
    /// Create a handler that plays `default` at `default_scale` whenever nothing is queued.
    /// The default sequence is registered in the library under its own name.
    pub fn new(default: SequenceHandle, default_scale: u32) -> Result<Self> {
        Self::with_config(default, default_scale, Config::default())
    }

    pub fn with_config(default: SequenceHandle, default_scale: u32, cfg: Config) -> Result<Self> {
        let default = PlaybackEntry::new(default, default_scale)?;
        let mut library = SequenceLib::default();
        library.insert(default.sequence.clone())?;
        Ok(Self {
            cfg,
            library,
            queue: VecDeque::new(),
            current: default.clone(),
            default,
            is_held: false,
            hold_remaining: 0,
            events: EventLog::default(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    // ----- library -----

    /// Register a new sequence, returning the shared handle to it.
    pub fn add_animation(&mut self, sequence: AnimationSequence) -> Result<SequenceHandle> {
        let handle = sequence.into_handle();
        self.add_shared(handle.clone())?;
        Ok(handle)
    }

    /// Register an existing handle.
    pub fn add_shared(&mut self, handle: SequenceHandle) -> Result<()> {
        self.library.insert(handle)
    }

    /// Unregister `name`. Entries already playing or queued keep their handle.
    pub fn remove_animation_by_name(&mut self, name: &str) -> Result<SequenceHandle> {
        self.library.remove(name)
    }

    pub fn get_animation(&self, name: &str) -> Result<SequenceHandle> {
        self.library.get(name)
    }

    /// Registered names, sorted.
    pub fn animation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.library.items.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    // ----- queue -----

    /// Push `sequence` onto the back of the queue.
    pub fn append_queue(&mut self, sequence: SequenceHandle, scale: u32) -> Result<()> {
        let entry = PlaybackEntry::new(sequence, scale)?;
        self.queue.push_back(entry);
        Ok(())
    }

    pub fn queue_by_name(&mut self, name: &str, scale: u32) -> Result<()> {
        let sequence = self.get_animation(name)?;
        self.append_queue(sequence, scale)
    }

    /// Replace the whole queue with `sequence`. The current entry keeps playing
    /// until it wraps.
    pub fn override_queue(&mut self, sequence: SequenceHandle, scale: u32) -> Result<()> {
        let entry = PlaybackEntry::new(sequence, scale)?;
        self.queue.clear();
        self.queue.push_back(entry);
        Ok(())
    }

    pub fn override_by_name(&mut self, name: &str, scale: u32) -> Result<()> {
        let sequence = self.get_animation(name)?;
        self.override_queue(sequence, scale)
    }

    pub fn clear_queue(&mut self) {
        self.queue.clear();
    }

    /// Drop the queue and switch to `name` right away, starting from its first frame.
    /// Any active hold is released.
    pub fn play_now(&mut self, name: &str, scale: u32) -> Result<()> {
        let entry = PlaybackEntry::new(self.get_animation(name)?, scale)?;
        self.queue.clear();
        self.is_held = false;
        self.hold_remaining = 0;
        self.current.sequence.borrow_mut().reset();
        entry.sequence.borrow_mut().reset();
        self.install(entry, StartSource::Immediate);
        Ok(())
    }

    pub fn queue(&self) -> impl Iterator<Item = &PlaybackEntry> {
        self.queue.iter()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    // ----- state -----

    pub fn current(&self) -> &PlaybackEntry {
        &self.current
    }

    pub fn default_entry(&self) -> &PlaybackEntry {
        &self.default
    }

    pub fn is_held(&self) -> bool {
        self.is_held
    }

    pub fn hold_remaining(&self) -> u32 {
        self.hold_remaining
    }

    /// Freeze the current frame for the next `frames` ticks. `0` cancels a hold.
    pub fn hold_current(&mut self, frames: u32) {
        self.is_held = frames > 0;
        self.hold_remaining = frames;
        if frames > 0 {
            self.record(HandlerEvent::HoldStarted { frames });
        }
    }

    // ----- tick -----

    /// Per-tick driver. Returns the frame addressed *before* this tick's advance.
    pub fn animate(&mut self, speed: f32) -> Result<RgbaImage> {
        if !speed.is_finite() || speed <= 0.0 {
            return Err(SpriteError::invalid(format!(
                "speed must be a positive finite number, got {speed}"
            )));
        }

        let frame = self.current.sequence.borrow().draw(self.current.scale)?;

        if self.is_held {
            self.hold_remaining = self.hold_remaining.saturating_sub(1);
            log::trace!("holding frame, {} ticks left", self.hold_remaining);
            if self.hold_remaining == 0 {
                self.is_held = false;
                let name = self.current.name();
                self.record(HandlerEvent::HoldReleased { name });
            }
            return Ok(frame);
        }

        let advance = self.current.sequence.borrow_mut().iterate(speed)?;
        log::trace!("advanced '{}': {:?}", self.current.name(), advance);
        if advance.is_wrapped() {
            let name = self.current.name();
            self.record(HandlerEvent::SequenceWrapped { name });
            self.advance_entry();
        }
        Ok(frame)
    }

    /// `animate` at the configured default speed.
    pub fn animate_default(&mut self) -> Result<RgbaImage> {
        self.animate(self.cfg.default_speed)
    }

    /// Number of events waiting to be drained.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Take all events recorded since the last call.
    pub fn drain_events(&mut self) -> Vec<HandlerEvent> {
        self.events.drain()
    }

    fn advance_entry(&mut self) {
        match self.queue.pop_front() {
            Some(next) => {
                log::debug!("queue -> '{}' x{}", next.name(), next.scale);
                self.install(next, StartSource::Queue);
            }
            None => {
                if self.current.same_as(&self.default) {
                    return;
                }
                log::debug!("queue empty, falling back to '{}'", self.default.name());
                self.install(self.default.clone(), StartSource::Default);
            }
        }
    }

    fn install(&mut self, entry: PlaybackEntry, source: StartSource) {
        self.record(HandlerEvent::SequenceStarted {
            name: entry.name(),
            scale: entry.scale,
            source,
        });
        self.current = entry;
    }

    fn record(&mut self, event: HandlerEvent) {
        if self.cfg.record_events {
            self.events.push(event, self.cfg.max_pending_events);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::atlas::{AtlasView, Cell, FrameSource};

    fn source() -> Arc<dyn FrameSource> {
        Arc::new(AtlasView::new(Arc::new(RgbaImage::new(8, 2)), 2, 2, None).unwrap())
    }

    fn seq(name: &str, n: u32) -> AnimationSequence {
        AnimationSequence::new(name, (0..n).map(|c| Cell::new(c, 0)), source()).unwrap()
    }

    #[test]
    fn default_is_registered_and_current() {
        let h = AnimationHandler::new(seq("idle", 2).into_handle(), 1).unwrap();
        assert_eq!(h.animation_names(), vec!["idle"]);
        assert_eq!(h.current().name(), "idle");
        assert!(h.current().same_as(h.default_entry()));
    }

    #[test]
    fn zero_scale_is_rejected_everywhere() {
        assert!(AnimationHandler::new(seq("idle", 2).into_handle(), 0).is_err());
        let mut h = AnimationHandler::new(seq("idle", 2).into_handle(), 1).unwrap();
        assert!(h.queue_by_name("idle", 0).is_err());
        assert!(h.override_by_name("idle", 0).is_err());
        assert_eq!(h.queue_len(), 0);
    }

    #[test]
    fn invalid_speed_leaves_state_untouched() {
        let mut h = AnimationHandler::new(seq("idle", 2).into_handle(), 1).unwrap();
        h.hold_current(2);
        assert!(h.animate(0.0).is_err());
        assert!(h.animate(f32::INFINITY).is_err());
        assert_eq!(h.hold_remaining(), 2);
    }

    #[test]
    fn removal_keeps_queued_handles_alive() {
        let mut h = AnimationHandler::new(seq("idle", 1).into_handle(), 1).unwrap();
        h.add_animation(seq("run", 1)).unwrap();
        h.queue_by_name("run", 1).unwrap();
        let removed = h.remove_animation_by_name("run").unwrap();
        assert!(h.get_animation("run").is_err());
        assert!(Rc::ptr_eq(&removed, &h.queue().next().unwrap().sequence));

        h.animate(1.0).unwrap();
        assert_eq!(h.current().name(), "run");
        assert_eq!(
            h.remove_animation_by_name("run").unwrap_err(),
            SpriteError::not_found("run")
        );
    }

    #[test]
    fn looping_default_emits_only_wraps() {
        let mut h = AnimationHandler::new(seq("idle", 1).into_handle(), 1).unwrap();
        h.animate(1.0).unwrap();
        h.animate(1.0).unwrap();
        assert_eq!(
            h.drain_events(),
            vec![
                HandlerEvent::SequenceWrapped {
                    name: "idle".into()
                },
                HandlerEvent::SequenceWrapped {
                    name: "idle".into()
                },
            ]
        );
    }

    #[test]
    fn disabled_events_record_nothing() {
        let cfg = Config {
            record_events: false,
            ..Config::default()
        };
        let mut h = AnimationHandler::with_config(seq("idle", 1).into_handle(), 1, cfg).unwrap();
        h.hold_current(1);
        h.animate(1.0).unwrap();
        h.animate(1.0).unwrap();
        assert_eq!(h.pending_events(), 0);
        assert!(h.drain_events().is_empty());
    }
}
