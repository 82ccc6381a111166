//! End-to-end weld scenarios against mock hardware
//!
//! A small rig drives the welder the way the firmware does: one system
//! tick per step, a zero crossing every step while mains is present, a
//! weld tick every fifth step, then one service pass.

use proptest::prelude::*;

use spotweld_core::config::{ConfigError, TriggerSource, WeldLimits, WeldSettings, WeldType};
use spotweld_core::mains::Polarity;
use spotweld_core::safety::{EnableError, Fault};
use spotweld_core::state::WeldEvent;
use spotweld_core::traits::{
    Buzzer, MeasureRelay, ThresholdOutput, TriggerSense, UiHooks, WeldOutput,
};
use spotweld_core::trigger::TriggerState;
use spotweld_core::weld::{CycleKind, StageError, WeldCycleSpec, WeldStage};
use spotweld_core::Welder;

#[derive(Debug, Default)]
struct MockBoard {
    weld: bool,
    relay: bool,
    buzzer: bool,
    threshold: Option<u8>,
    contact: bool,
    foot: bool,
    in_crossing: bool,
    /// For every off-to-on switch: whether it happened inside a crossing
    switch_ons: Vec<bool>,
}

impl WeldOutput for MockBoard {
    fn set_weld(&mut self, on: bool) {
        if on && !self.weld {
            self.switch_ons.push(self.in_crossing);
        }
        self.weld = on;
    }

    fn is_weld_on(&self) -> bool {
        self.weld
    }
}

impl MeasureRelay for MockBoard {
    fn set_measure_relay(&mut self, on: bool) {
        self.relay = on;
    }
}

impl TriggerSense for MockBoard {
    fn contact_sensed(&mut self) -> bool {
        self.contact
    }

    fn foot_switch_pressed(&mut self) -> bool {
        self.foot
    }
}

impl ThresholdOutput for MockBoard {
    fn set_threshold(&mut self, level: u8) {
        self.threshold = Some(level);
    }
}

impl Buzzer for MockBoard {
    fn set_buzzer(&mut self, on: bool) {
        self.buzzer = on;
    }
}

#[derive(Debug)]
struct MockUi {
    active: bool,
    redraws: u32,
    hint_clears: u32,
    activity_resets: u32,
    fault: Option<Fault>,
}

impl Default for MockUi {
    fn default() -> Self {
        Self {
            active: true,
            redraws: 0,
            hint_clears: 0,
            activity_resets: 0,
            fault: None,
        }
    }
}

impl UiHooks for MockUi {
    fn request_redraw(&mut self) {
        self.redraws += 1;
    }

    fn clear_redraw_hint(&mut self) {
        self.hint_clears += 1;
    }

    fn reset_activity(&mut self) {
        self.activity_resets += 1;
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn show_fault(&mut self, fault: Fault) {
        self.fault = Some(fault);
    }

    fn clear_fault(&mut self) {
        self.fault = None;
    }
}

struct Rig {
    welder: Welder<MockBoard, MockUi>,
    mains: bool,
    polarity: Polarity,
    step: u32,
    events: Vec<WeldEvent>,
    /// Weld output level after each step
    output: Vec<bool>,
}

impl Rig {
    fn new(settings: WeldSettings) -> Self {
        Self {
            welder: Welder::new(MockBoard::default(), MockUi::default(), settings),
            mains: true,
            polarity: Polarity::Low,
            step: 0,
            events: Vec::new(),
            output: Vec::new(),
        }
    }

    fn enabled(settings: WeldSettings) -> Self {
        let mut rig = Self::new(settings);
        rig.run(2);
        rig.welder.enable_weld().unwrap();
        rig.run(3);
        rig
    }

    fn step(&mut self) {
        self.welder.on_system_tick();

        if self.mains {
            self.polarity = match self.polarity {
                Polarity::Low => Polarity::High,
                Polarity::High => Polarity::Low,
            };
            self.welder.with_hw(|b| b.in_crossing = true);
            self.welder.on_zero_cross(self.polarity);
            self.welder.with_hw(|b| b.in_crossing = false);
        }

        if self.step % 5 == 4 {
            self.welder.on_weld_tick();
        }

        self.welder.service();
        self.step += 1;

        while let Some(e) = self.welder.pop_event() {
            self.events.push(e.event);
        }

        let weld = self.welder.with_hw(|b| b.weld);
        if weld {
            assert!(
                self.welder.is_weld_enabled() && self.welder.active_stage().output_allowed(),
                "output on in stage {:?}",
                self.welder.active_stage()
            );
        }
        self.output.push(weld);
    }

    fn run(&mut self, steps: u32) {
        for _ in 0..steps {
            self.step();
        }
    }

    fn run_until(&mut self, max_steps: u32, mut done: impl FnMut(&Welder<MockBoard, MockUi>) -> bool) {
        for _ in 0..max_steps {
            if done(&self.welder) {
                return;
            }
            self.step();
        }
        panic!("condition not reached within {max_steps} steps");
    }

    fn press_foot(&mut self) {
        self.welder.with_hw(|b| b.foot = true);
        self.welder.on_foot_switch_edge();
    }

    fn release_foot(&mut self) {
        self.welder.with_hw(|b| b.foot = false);
    }

    fn touch(&mut self) {
        self.welder.with_hw(|b| b.contact = true);
        self.welder.on_contact_edge();
    }

    fn lift(&mut self) {
        self.welder.with_hw(|b| b.contact = false);
    }

    fn stage_sequence(&self) -> Vec<WeldStage> {
        self.events
            .iter()
            .filter_map(|e| match e {
                WeldEvent::StageChanged { to, .. } => Some(*to),
                _ => None,
            })
            .collect()
    }

    /// Lengths (in steps) of every period the output was on
    fn on_windows(&self) -> Vec<usize> {
        let mut windows = Vec::new();
        let mut run = 0;
        for &on in &self.output {
            if on {
                run += 1;
            } else if run > 0 {
                windows.push(run);
                run = 0;
            }
        }
        if run > 0 {
            windows.push(run);
        }
        windows
    }

    fn count(&self, pred: impl Fn(&WeldEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

fn double_pulse() -> WeldSettings {
    WeldSettings {
        pulse0_ms: 250,
        interpulse_ms: 100,
        pulse1_ms: 300,
        trigger_delay_ms: 100,
        trigger: TriggerSource::FootSwitch,
        weld_type: WeldType::DoublePulse,
        ..Default::default()
    }
}

#[test]
fn double_pulse_foot_switch_sequence() {
    let mut rig = Rig::enabled(double_pulse());
    assert!(rig.welder.is_weld_enabled());

    rig.press_foot();
    rig.run(120);
    rig.release_foot();
    rig.run(5);

    let stages = rig.stage_sequence();
    assert_eq!(
        &stages[..4],
        &[
            WeldStage::Pulse0,
            WeldStage::Delay,
            WeldStage::Pulse1,
            WeldStage::End
        ]
    );

    // Two output windows: 250 ms and 300 ms, less the wait for the crossing
    let windows = rig.on_windows();
    assert_eq!(windows.len(), 2);
    assert!((20..=25).contains(&windows[0]), "pulse 0 lasted {}", windows[0]);
    assert!((25..=30).contains(&windows[1]), "pulse 1 lasted {}", windows[1]);

    // Each window began on a zero crossing
    let switch_ons = rig.welder.with_hw(|b| b.switch_ons.clone());
    assert_eq!(switch_ons, vec![true, true]);

    assert_eq!(rig.count(|e| matches!(e, WeldEvent::CycleStarted(CycleKind::Double))), 1);
    assert_eq!(rig.count(|e| *e == WeldEvent::CycleFinished), 1);
    assert_eq!(rig.welder.with_ui(|ui| ui.hint_clears), 1);
}

#[test]
fn weld_rearms_after_interweld_delay() {
    let mut rig = Rig::enabled(double_pulse());

    rig.press_foot();
    rig.run(20);
    rig.release_foot();
    rig.run_until(200, |w| w.active_stage() == WeldStage::End && w.is_weld_triggered() == TriggerState::Cooldown);

    // Inter-weld delay of one second before the next trigger is accepted
    rig.run(90);
    assert_eq!(rig.welder.is_weld_triggered(), TriggerState::Cooldown);
    rig.run_until(30, |w| w.is_weld_triggered() == TriggerState::Idle);
    assert_eq!(rig.welder.active_stage(), WeldStage::Wait);

    rig.run(2);
    rig.press_foot();
    rig.run_until(30, |w| w.is_weld_triggered() == TriggerState::Cooldown);
    rig.run_until(100, |w| w.active_stage() == WeldStage::End);
    assert_eq!(rig.count(|e| matches!(e, WeldEvent::CycleStarted(_))), 2);
}

#[test]
fn continuous_weld_follows_foot_switch() {
    let mut rig = Rig::enabled(WeldSettings::default());

    rig.press_foot();
    rig.run_until(20, |w| w.active_stage() == WeldStage::Run);
    assert!(rig.welder.with_hw(|b| b.weld));

    for _ in 0..150 {
        rig.step();
        assert_eq!(rig.welder.active_stage(), WeldStage::Run);
        assert!(rig.welder.with_hw(|b| b.weld));
    }

    rig.release_foot();
    rig.run(2);
    assert!(!rig.welder.with_hw(|b| b.weld));
    assert_eq!(rig.welder.active_stage(), WeldStage::End);

    // One uninterrupted window, switched on at a crossing
    assert_eq!(rig.on_windows().len(), 1);
    assert_eq!(rig.welder.with_hw(|b| b.switch_ons.clone()), vec![true]);
}

#[test]
fn contact_trigger_single_pulse() {
    let settings = WeldSettings {
        trigger: TriggerSource::Contact,
        weld_type: WeldType::SinglePulse,
        pulse0_ms: 100,
        contact_threshold: 90,
        ..Default::default()
    };
    let mut rig = Rig::enabled(settings);
    assert_eq!(rig.welder.with_hw(|b| b.threshold), Some(90));
    assert!(rig.welder.with_hw(|b| b.relay));

    rig.touch();
    rig.run_until(20, |w| w.is_weld_triggered() == TriggerState::Firing);
    assert!(!rig.welder.with_hw(|b| b.relay));

    rig.run_until(40, |w| w.active_stage() == WeldStage::End);
    rig.lift();
    rig.run(5);

    assert_eq!(rig.on_windows().len(), 1);
    // Measurement relay reconnected for the release check
    assert!(rig.welder.with_hw(|b| b.relay));
}

#[test]
fn early_release_drops_trigger() {
    let mut rig = Rig::enabled(double_pulse());

    rig.press_foot();
    rig.run(4);
    assert_eq!(rig.welder.is_weld_triggered(), TriggerState::Armed);
    rig.release_foot();
    rig.run(20);

    assert_eq!(rig.welder.is_weld_triggered(), TriggerState::Idle);
    assert_eq!(rig.count(|e| *e == WeldEvent::TriggerDropped), 1);
    assert_eq!(rig.count(|e| matches!(e, WeldEvent::CycleStarted(_))), 0);
    assert!(rig.on_windows().is_empty());
}

#[test]
fn start_rejected_while_cycle_in_progress() {
    for trigger in [TriggerSource::FootSwitch, TriggerSource::Contact] {
        let settings = WeldSettings {
            trigger,
            ..double_pulse()
        };
        let mut rig = Rig::enabled(settings);

        match trigger {
            TriggerSource::FootSwitch => rig.press_foot(),
            TriggerSource::Contact => rig.touch(),
        }
        rig.run_until(40, |w| w.active_stage() == WeldStage::Pulse0);
        let spec = WeldCycleSpec::from_settings(&settings).unwrap();

        for _ in 0..30 {
            let before = rig.welder.active_cycle();
            assert!(!before.stage.is_settled());
            assert_eq!(rig.welder.start_cycle(&spec), Err(StageError::Busy));
            assert_eq!(rig.welder.set_active_stage(WeldStage::Wait), Err(StageError::Busy));
            assert_eq!(rig.welder.active_cycle(), before);
            match trigger {
                TriggerSource::FootSwitch => rig.welder.on_foot_switch_edge(),
                TriggerSource::Contact => rig.welder.on_contact_edge(),
            }
            rig.step();
            if rig.welder.active_stage().is_settled() {
                break;
            }
        }

        match trigger {
            TriggerSource::FootSwitch => rig.release_foot(),
            TriggerSource::Contact => rig.lift(),
        }
        rig.run(60);
        assert_eq!(rig.count(|e| matches!(e, WeldEvent::CycleStarted(_))), 1);
        assert_eq!(rig.on_windows().len(), 2);
    }
}

#[test]
fn emergency_halt_from_every_stage() {
    for target in [
        WeldStage::Wait,
        WeldStage::Pulse0,
        WeldStage::Delay,
        WeldStage::Pulse1,
    ] {
        let mut rig = Rig::enabled(double_pulse());
        rig.press_foot();
        rig.run_until(60, |w| w.active_stage() == target);

        rig.welder.emergency_halt();
        let cycle = rig.welder.active_cycle();
        assert_eq!(cycle.stage, WeldStage::End);
        assert!(!cycle.armed);
        assert!(cycle.pending.is_none());
        assert!(!rig.welder.with_hw(|b| b.weld));
        assert!(!rig.welder.is_weld_enabled());

        rig.welder.emergency_halt();
        assert_eq!(rig.welder.active_cycle(), cycle);
        assert!(!rig.welder.with_hw(|b| b.weld));
        assert!(!rig.welder.is_weld_enabled());

        // Nothing restarts while the trigger is still held
        let started = rig.count(|e| matches!(e, WeldEvent::CycleStarted(_)));
        let on_steps = rig.output.iter().filter(|&&on| on).count();
        rig.welder.on_foot_switch_edge();
        rig.run(80);
        assert!(rig.output.iter().rev().take(80).all(|&on| !on));
        assert_eq!(rig.output.iter().filter(|&&on| on).count(), on_steps);
        assert_eq!(rig.count(|e| matches!(e, WeldEvent::CycleStarted(_))), started);
        assert!(!rig.welder.is_weld_enabled());
    }
}

#[test]
fn emergency_halt_stops_continuous_run() {
    let mut rig = Rig::enabled(WeldSettings::default());
    rig.press_foot();
    rig.run_until(20, |w| w.active_stage() == WeldStage::Run);
    assert!(rig.welder.with_hw(|b| b.weld));

    rig.welder.emergency_halt();
    assert_eq!(rig.welder.active_stage(), WeldStage::End);
    assert!(!rig.welder.with_hw(|b| b.weld));
    assert!(!rig.welder.is_weld_enabled());
    let windows = rig.on_windows().len();

    // Foot switch still held: the output must not come back
    rig.run(40);
    assert!(rig.output.iter().rev().take(40).all(|&on| !on));
    assert_eq!(rig.on_windows().len(), windows);
    assert_ne!(rig.welder.active_stage(), WeldStage::Run);
    assert_eq!(rig.welder.is_weld_triggered(), TriggerState::Cooldown);

    // Re-enabling needs a fresh press before welding again
    rig.welder.enable_weld().unwrap();
    rig.run(20);
    assert!(rig.output.iter().rev().take(20).all(|&on| !on));
}

#[test]
fn enable_checks_configured_limits() {
    let limits = WeldLimits {
        max_pulse_ms: 200,
        ..WeldLimits::default()
    };
    let welder = Welder::with_limits(
        MockBoard::default(),
        MockUi::default(),
        double_pulse(),
        limits,
    );
    assert_eq!(welder.limits(), limits);
    assert_eq!(
        welder.enable_weld(),
        Err(EnableError::Config(ConfigError::Pulse0Length))
    );
    assert!(!welder.is_weld_enabled());
    assert_eq!(welder.with_hw(|b| b.threshold), None);
}

#[test]
fn disable_halts_and_opens_relay() {
    let settings = WeldSettings {
        trigger: TriggerSource::Contact,
        ..double_pulse()
    };
    let mut rig = Rig::enabled(settings);
    rig.touch();
    rig.run_until(60, |w| w.active_stage() == WeldStage::Pulse0);

    rig.welder.disable_weld();
    assert!(!rig.welder.is_weld_enabled());
    assert_eq!(rig.welder.active_stage(), WeldStage::End);
    rig.welder.with_hw(|b| {
        assert!(!b.weld);
        assert!(!b.relay);
    });

    rig.run(50);
    assert_eq!(rig.on_windows().len(), 1);
}

#[test]
fn mains_loss_disables_until_crossings_return() {
    let mut rig = Rig::enabled(double_pulse());

    rig.mains = false;
    rig.run(12);

    assert!(!rig.welder.is_weld_enabled());
    assert!(rig.welder.zero_cross_status().lost);
    assert_eq!(rig.welder.fault(), Some(Fault::AcLost));
    assert_eq!(rig.welder.with_ui(|ui| ui.fault), Some(Fault::AcLost));
    assert!(rig.welder.with_hw(|b| b.buzzer));
    assert_eq!(rig.welder.enable_weld(), Err(EnableError::AcLost));

    // Stays inert however long the mains is missing
    rig.run(200);
    assert!(!rig.welder.is_weld_enabled());
    assert_eq!(rig.count(|e| *e == WeldEvent::FaultLatched(Fault::AcLost)), 1);

    rig.mains = true;
    rig.run(1);
    assert!(!rig.welder.zero_cross_status().lost);
    assert!(rig.welder.is_weld_enabled());
    assert_eq!(rig.welder.fault(), None);
    assert_eq!(rig.welder.with_ui(|ui| ui.fault), None);
    assert_eq!(rig.count(|e| *e == WeldEvent::AcRestored), 1);
}

#[test]
fn mains_loss_mid_cycle_halts_immediately() {
    let mut rig = Rig::enabled(double_pulse());

    rig.press_foot();
    rig.run_until(60, |w| w.active_stage() == WeldStage::Delay);
    rig.mains = false;
    rig.run_until(40, |w| !w.is_weld_enabled());

    assert_eq!(rig.welder.active_stage(), WeldStage::End);
    assert!(!rig.welder.with_hw(|b| b.weld));
    assert_eq!(rig.welder.fault(), Some(Fault::AcLost));
    assert_eq!(rig.on_windows().len(), 1);
}

#[test]
fn inactive_ui_locks_out_trigger() {
    let mut rig = Rig::enabled(double_pulse());

    rig.welder.with_ui(|ui| ui.active = false);
    rig.run(2);
    assert_eq!(rig.welder.active_stage(), WeldStage::End);
    assert_eq!(rig.welder.is_weld_triggered(), TriggerState::Cooldown);

    // A press only wakes the UI
    let resets = rig.welder.with_ui(|ui| ui.activity_resets);
    rig.press_foot();
    assert_eq!(rig.welder.with_ui(|ui| ui.activity_resets), resets + 1);
    rig.run(150);
    assert!(rig.on_windows().is_empty());
    rig.release_foot();

    rig.welder.with_ui(|ui| ui.active = true);
    rig.run_until(120, |w| w.is_weld_triggered() == TriggerState::Idle);
    assert_eq!(rig.welder.active_stage(), WeldStage::Wait);
}

#[test]
fn enable_reports_offending_field() {
    let rig = Rig::new(WeldSettings {
        pulse1_ms: 20_000,
        ..Default::default()
    });
    let err = rig.welder.enable_weld().unwrap_err();
    assert_eq!(err, EnableError::Config(ConfigError::Pulse1Length));
    assert_eq!(err.code(), -2);
    assert!(!rig.welder.is_weld_enabled());
}

#[test]
fn settings_update_refused_mid_cycle() {
    let mut rig = Rig::enabled(double_pulse());
    rig.press_foot();
    rig.run_until(60, |w| w.active_stage() == WeldStage::Pulse1);

    let settings = WeldSettings::default();
    assert_eq!(rig.welder.update_settings(settings), Err(StageError::Busy));
    assert_eq!(rig.welder.settings(), double_pulse());
}

#[test]
fn invalid_settings_update_disables() {
    let rig = Rig::enabled(double_pulse());
    let settings = WeldSettings {
        trigger_delay_ms: 5_000,
        ..double_pulse()
    };
    assert_eq!(rig.welder.update_settings(settings), Ok(()));
    assert!(!rig.welder.is_weld_enabled());
}

#[test]
fn set_active_stage_codes() {
    let rig = Rig::new(WeldSettings::default());
    assert_eq!(
        rig.welder.set_active_stage(WeldStage::End).map_err(StageError::code),
        Err(0)
    );

    let rig = Rig::enabled(WeldSettings::default());
    assert_eq!(rig.welder.set_active_stage(WeldStage::End), Ok(()));
    assert_eq!(rig.welder.active_stage(), WeldStage::End);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn enable_accepts_all_in_bounds(
        p0 in 50u16..=10_000,
        p1 in 50u16..=10_000,
        ip in 50u16..=1_000,
        td in 50u16..=1_000,
    ) {
        let rig = Rig::new(WeldSettings {
            pulse0_ms: p0,
            pulse1_ms: p1,
            interpulse_ms: ip,
            trigger_delay_ms: td,
            ..Default::default()
        });
        prop_assert_eq!(rig.welder.enable_weld(), Ok(()));
        prop_assert!(rig.welder.is_weld_enabled());
    }

    #[test]
    fn enable_names_the_out_of_bounds_delay(
        ip in prop_oneof![0u16..50, 1_001u16..=u16::MAX],
    ) {
        let rig = Rig::new(WeldSettings { interpulse_ms: ip, ..Default::default() });
        let err = rig.welder.enable_weld().unwrap_err();
        prop_assert_eq!(err.code(), -3);
        prop_assert!(!rig.welder.is_weld_enabled());
    }
}
