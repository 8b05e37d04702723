//! Timed input choreography for menu navigation.
//!
//! Everything here is open-loop: press, sleep, release, sleep. There is no
//! feedback on whether the game registered an input; the delays are tuned
//! empirically against the emulator's menu animation timing. Sequences run
//! to completion once started and are never interrupted mid-flight.

use anyhow::Result;
use std::time::Duration;

use crate::config::{KeyConfig, TimingConfig};
use crate::input::KeyInjector;

/// Composes press/release primitives into named menu sequences.
pub struct Choreographer<I> {
    injector: I,
    timing: TimingConfig,
    keys: KeyConfig,
}

impl<I: KeyInjector> Choreographer<I> {
    pub fn new(injector: I, timing: TimingConfig, keys: KeyConfig) -> Self {
        Self {
            injector,
            timing,
            keys,
        }
    }

    fn sleep_ms(&self, ms: u64) {
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }

    /// Press a key, hold it for `duration_ms`, release, then wait the
    /// standard inter-action gap.
    fn press(&mut self, key: &str, duration_ms: u64) -> Result<()> {
        self.injector.press(key)?;
        self.sleep_ms(duration_ms);
        self.injector.release(key)?;
        self.sleep_ms(self.timing.input_gap_ms);
        Ok(())
    }

    /// Hold direction key(s), wait, press confirm while held, release
    /// confirm, keep holding briefly, then release the directions.
    ///
    /// Several postgame menus only accept the confirm while a direction is
    /// actively held, hence the ordering.
    fn hold_then_confirm(&mut self, confirm: &str, holds: &[String]) -> Result<()> {
        for k in holds {
            self.injector.press(k)?;
        }
        self.sleep_ms(self.timing.dir_hold_before_confirm_ms);

        self.injector.press(confirm)?;
        self.sleep_ms(self.timing.confirm_hold_ms);
        self.injector.release(confirm)?;

        self.sleep_ms(self.timing.release_after_ms);
        for k in holds {
            self.injector.release(k)?;
        }
        self.sleep_ms(self.timing.input_gap_ms);
        Ok(())
    }

    /// Long stick hold that pins the cursor to one end of the team list.
    /// Idempotent regardless of where the cursor started, which is the
    /// whole point: after this the position is known.
    fn force_to_extreme(&mut self, dir: &str) -> Result<()> {
        self.injector.press(dir)?;
        self.sleep_ms(self.timing.force_side_hold_ms);
        self.injector.release(dir)?;
        self.sleep_ms(self.timing.force_settle_ms);
        Ok(())
    }

    /// Short stick press moving the cursor exactly one position. Only
    /// meaningful right after a force-to-extreme.
    fn step(&mut self, dir: &str) -> Result<()> {
        self.injector.press(dir)?;
        self.sleep_ms(self.timing.step_ms);
        self.injector.release(dir)?;
        self.sleep_ms(self.timing.step_settle_ms);
        Ok(())
    }

    /// Hold L2+R2 to reroll the team under the cursor.
    fn randomize_team(&mut self) -> Result<()> {
        let l2 = self.keys.l2.clone();
        let r2 = self.keys.r2.clone();
        self.injector.press(&l2)?;
        self.injector.press(&r2)?;
        self.sleep_ms(self.timing.randomize_hold_ms);
        self.injector.release(&l2)?;
        self.injector.release(&r2)?;
        self.sleep_ms(self.timing.randomize_settle_ms);
        Ok(())
    }

    // ---- named sequences ----

    /// End screen: Circle opens the postgame menu.
    pub fn open_postgame_menu(&mut self) -> Result<()> {
        crate::log("ACTION: open postgame menu");
        let back = self.keys.back.clone();
        self.press(&back, self.timing.menu_open_press_ms)
    }

    /// Postgame hub: hold down + confirm opens Game Stats.
    pub fn open_game_stats(&mut self) -> Result<()> {
        crate::log("ACTION: open game stats");
        let confirm = self.keys.confirm.clone();
        let holds = [self.keys.stick_down.clone()];
        self.hold_then_confirm(&confirm, &holds)
    }

    /// Stats menu: hold up + confirm opens the box score.
    pub fn open_box_score(&mut self) -> Result<()> {
        crate::log("ACTION: open box score");
        let confirm = self.keys.confirm.clone();
        let holds = [self.keys.stick_up.clone()];
        self.hold_then_confirm(&confirm, &holds)
    }

    /// Circle once to return to the previous screen.
    pub fn back_one_screen(&mut self) -> Result<()> {
        crate::log("ACTION: back one screen");
        let back = self.keys.back.clone();
        self.press(&back, self.timing.back_press_ms)
    }

    /// Postgame hub: hold down + left + confirm selects Quit.
    pub fn confirm_quit(&mut self) -> Result<()> {
        crate::log("ACTION: confirm quit");
        let confirm = self.keys.confirm.clone();
        let holds = [self.keys.stick_down.clone(), self.keys.stick_left.clone()];
        self.hold_then_confirm(&confirm, &holds)
    }

    /// Quit menu: hold down + confirm selects Quick Game.
    pub fn enter_quick_game(&mut self) -> Result<()> {
        crate::log("ACTION: enter quick game");
        let confirm = self.keys.confirm.clone();
        let holds = [self.keys.stick_down.clone()];
        self.hold_then_confirm(&confirm, &holds)
    }

    /// Quick Game setup: randomize both teams, return the cursor to the
    /// center CPU-vs-CPU slot, and start the match.
    ///
    /// The cursor's starting position is unknown, so each side is reached
    /// with a force-to-extreme before its randomize; the center slot is
    /// exactly one step left of the right extreme.
    pub fn randomize_and_start(&mut self) -> Result<()> {
        crate::log("ACTION: randomize both teams and start");
        self.sleep_ms(self.timing.settle_long_ms);

        let left = self.keys.stick_left.clone();
        let right = self.keys.stick_right.clone();
        let start = self.keys.start.clone();

        self.force_to_extreme(&left)?;
        crate::log(" - randomizing AWAY (left)");
        self.randomize_team()?;

        self.force_to_extreme(&right)?;
        crate::log(" - randomizing HOME (right)");
        self.randomize_team()?;

        crate::log(" - stepping back to center");
        self.step(&left)?;

        crate::log(" - starting match");
        self.press(&start, self.timing.start_press_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Injector that records press/release events as "+key"/"-key".
    #[derive(Clone)]
    struct RecordingInjector {
        events: Rc<RefCell<Vec<String>>>,
    }

    impl RecordingInjector {
        fn new() -> Self {
            Self {
                events: Rc::new(RefCell::new(Vec::new())),
            }
        }
        fn events(&self) -> Vec<String> {
            self.events.borrow().clone()
        }
    }

    impl KeyInjector for RecordingInjector {
        fn press(&mut self, key: &str) -> Result<()> {
            self.events.borrow_mut().push(format!("+{}", key));
            Ok(())
        }
        fn release(&mut self, key: &str) -> Result<()> {
            self.events.borrow_mut().push(format!("-{}", key));
            Ok(())
        }
    }

    fn zero_timing() -> TimingConfig {
        TimingConfig {
            check_interval_ms: 0,
            lock_poll_ms: 0,
            input_gap_ms: 0,
            menu_open_press_ms: 0,
            back_press_ms: 0,
            start_press_ms: 0,
            dir_hold_before_confirm_ms: 0,
            confirm_hold_ms: 0,
            release_after_ms: 0,
            settle_short_ms: 0,
            settle_long_ms: 0,
            force_side_hold_ms: 0,
            force_settle_ms: 0,
            step_ms: 0,
            step_settle_ms: 0,
            randomize_hold_ms: 0,
            randomize_settle_ms: 0,
            game_lock_ms: 0,
        }
    }

    fn make_choreo() -> (Choreographer<RecordingInjector>, RecordingInjector) {
        let injector = RecordingInjector::new();
        let choreo = Choreographer::new(injector.clone(), zero_timing(), KeyConfig::default());
        (choreo, injector)
    }

    #[test]
    fn test_hold_then_confirm_ordering() {
        let (mut choreo, injector) = make_choreo();
        choreo.confirm_quit().unwrap();

        // Directions down first, confirm pressed and released while both
        // directions are still held, directions released last
        assert_eq!(
            injector.events(),
            vec!["+s", "+a", "+x", "-x", "-s", "-a"]
        );
    }

    #[test]
    fn test_open_postgame_menu_is_single_press() {
        let (mut choreo, injector) = make_choreo();
        choreo.open_postgame_menu().unwrap();
        assert_eq!(injector.events(), vec!["+c", "-c"]);
    }

    #[test]
    fn test_open_box_score_holds_up() {
        let (mut choreo, injector) = make_choreo();
        choreo.open_box_score().unwrap();
        assert_eq!(injector.events(), vec!["+w", "+x", "-x", "-w"]);
    }

    #[test]
    fn test_randomize_and_start_full_sequence() {
        let (mut choreo, injector) = make_choreo();
        choreo.randomize_and_start().unwrap();

        let events = injector.events();
        // force left, randomize, force right, randomize, step left, start
        assert_eq!(
            events,
            vec![
                "+a", "-a", // force left
                "+r", "+t", "-r", "-t", // randomize away
                "+d", "-d", // force right
                "+r", "+t", "-r", "-t", // randomize home
                "+a", "-a", // one step back to center
                "+enter", "-enter", // start
            ]
        );
    }

    #[test]
    fn test_every_press_is_released() {
        let (mut choreo, injector) = make_choreo();
        choreo.open_postgame_menu().unwrap();
        choreo.open_game_stats().unwrap();
        choreo.open_box_score().unwrap();
        choreo.back_one_screen().unwrap();
        choreo.confirm_quit().unwrap();
        choreo.enter_quick_game().unwrap();
        choreo.randomize_and_start().unwrap();

        let mut held: Vec<String> = Vec::new();
        for ev in injector.events() {
            let (kind, key) = ev.split_at(1);
            match kind {
                "+" => held.push(key.to_string()),
                "-" => {
                    let pos = held.iter().position(|k| k == key);
                    assert!(pos.is_some(), "released {} without press", key);
                    held.remove(pos.unwrap());
                }
                _ => unreachable!(),
            }
        }
        assert!(held.is_empty(), "keys left held: {:?}", held);
    }
}
