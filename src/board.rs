//! Glue between the IR receiver and the STM32F0 peripherals it drives.

use embedded_hal::digital::v2::OutputPin;
use irthermo::{config::LinkConfig, ir::RxHardware};
use stm32f0xx_hal::{
    pac::{EXTI, TIM16},
    prelude::*,
    time::Hertz,
    timers::{Event, Timer},
};

/// EXTI lines of the four buttons, PA0-PA3
pub const BUTTON_LINES: u32 = 0b0_1111;
/// EXTI line of the detector, PA4
pub const DETECTOR_LINE: u32 = 1 << 4;

/// Arms falling-edge interrupts on the button and detector lines.
///
/// Lines 0-4 route from port A out of reset, so SYSCFG is left alone.
pub fn setup_exti(exti: &EXTI) {
    let lines = BUTTON_LINES | DETECTOR_LINE;
    exti.ftsr.modify(|r, w| unsafe { w.bits(r.bits() | lines) });
    exti.pr.write(|w| unsafe { w.bits(lines) });
    exti.imr.modify(|r, w| unsafe { w.bits(r.bits() | lines) });
}

/// Clears and returns the pending lines within `mask`
pub fn take_pending(exti: &EXTI, mask: u32) -> u32 {
    let pending = exti.pr.read().bits() & mask;
    exti.pr.write(|w| unsafe { w.bits(pending) });
    pending
}

/// Drives an activity LED
pub fn indicate<P: OutputPin>(led: &mut P, active: bool) -> Result<(), P::Error> {
    if active {
        led.set_high()
    } else {
        led.set_low()
    }
}

/// TIM16 as the slot sampler: first period half a beat, then one beat.
pub struct SlotSampler {
    timer: Timer<TIM16>,
    half_beat: Hertz,
    beat: Hertz,
    first: bool,
}

impl SlotSampler {
    pub fn new(mut timer: Timer<TIM16>, config: &LinkConfig) -> Self {
        timer.unlisten(Event::TimeOut);
        Self {
            timer,
            half_beat: Hertz(config.half_beat().raw()),
            beat: Hertz(config.beat.raw()),
            first: false,
        }
    }

    fn start(&mut self) {
        self.first = true;
        self.timer.start(self.half_beat);
        self.timer.listen(Event::TimeOut);
    }

    fn stop(&mut self) {
        self.timer.unlisten(Event::TimeOut);
        // Drop an update that fired before the interrupt was masked
        let _ = self.timer.wait();
    }

    /// Clears the update flag. After the first, half-beat, period the timer restarts at the
    /// beat rate so later samples stay mid-slot.
    pub fn acknowledge(&mut self) {
        // Only clears UIF; the interrupt means the period already elapsed
        let _ = self.timer.wait();
        if self.first {
            self.first = false;
            self.timer.start(self.beat);
        }
    }
}

/// Borrows what the receiver needs for one handler run
pub struct RxBoard<'a> {
    pub exti: &'a EXTI,
    pub sampler: &'a mut SlotSampler,
}

impl RxHardware for RxBoard<'_> {
    fn start_sampling(&mut self) {
        self.sampler.start();
    }

    fn stop_sampling(&mut self) {
        self.sampler.stop();
    }

    fn enable_edge(&mut self) {
        // Edges seen while masked still latch in PR
        self.exti.pr.write(|w| unsafe { w.bits(DETECTOR_LINE) });
        self.exti
            .imr
            .modify(|r, w| unsafe { w.bits(r.bits() | DETECTOR_LINE) });
    }

    fn disable_edge(&mut self) {
        self.exti
            .imr
            .modify(|r, w| unsafe { w.bits(r.bits() & !DETECTOR_LINE) });
    }
}
