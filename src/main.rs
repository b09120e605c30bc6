#![feature(type_alias_impl_trait, lint_reasons)]
#![no_std]
#![no_main]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::wildcard_imports)]

mod acquisition;
mod board;

use defmt_rtt as _;
use irthermo::ir::CarrierGate;
use panic_probe as _;

/// Transmit flag from the beat task to the carrier loop in `idle`
static CARRIER: CarrierGate = CarrierGate::new();

#[rtic::app(device = stm32f0xx_hal::pac, dispatchers = [USART1, SPI1])]
mod app {
    use defmt::{unreachable, *};
    use irthermo::{
        config::{LinkConfig, SYSCLK},
        delay::CycleDelay,
        ds18b20::Ds18b20,
        ir::{self, Button, DebounceBank, PeerStateHolder, Receiver, Transmitter},
        onewire::{OneWire, OpenDrainLine},
        thermometer::Temperature,
    };
    use rtic_monotonics::{
        stm32::{Tim2 as Mono, *},
        Monotonic,
    };
    use rtic_sync::{
        channel::{ReceiveError, Receiver as ChannelReceiver, Sender},
        make_channel,
    };
    use stm32f0xx_hal::{
        gpio::{Input, OpenDrain, Output, Pin, PullUp, PushPull},
        pac::{EXTI, IWDG, TIM3},
        prelude::*,
        time::Hertz,
        timers::{Event, Timer},
        watchdog::Watchdog,
    };

    use crate::{
        board::{self, RxBoard, SlotSampler, BUTTON_LINES, DETECTOR_LINE},
        CARRIER,
    };

    const LINK: LinkConfig = LinkConfig::DEFAULT;

    type Wire = OneWire<OpenDrainLine<Pin<Output<OpenDrain>>>>;

    #[shared]
    struct Shared {
        tx: Transmitter,
        debounce: DebounceBank,
        peer: PeerStateHolder,
        #[lock_free]
        rx: Receiver,
        #[lock_free]
        sampler: SlotSampler,
        #[lock_free]
        exti: EXTI,
    }

    #[local]
    struct Local {
        beat_timer: Timer<TIM3>,
        tx_led: Pin<Output<PushPull>>,
        rx_led: Pin<Output<PushPull>>,
        detector: Pin<Input<PullUp>>,
        emitter: Pin<Output<PushPull>>,

        // Temperature acquisition
        wire: Wire,
        sensor: Ds18b20,
        delay: CycleDelay,
        temps: Sender<'static, Temperature, 1>,
    }

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local) {
        // Set system clock to 24 MHz
        let mut rcc = cx
            .device
            .RCC
            .configure()
            .hsi48()
            .sysclk(SYSCLK.raw().hz())
            .pclk(SYSCLK.raw().hz())
            .hclk(SYSCLK.raw().hz())
            .freeze(&mut cx.device.FLASH);

        trace!("sysclk: {}", rcc.clocks.sysclk().0);
        trace!("pclk: {}", rcc.clocks.pclk().0);

        // Enable tim2 monotonic
        let token = rtic_monotonics::create_stm32_tim2_monotonic_token!();
        Mono::start(SYSCLK.raw(), token);

        let mut delay = CycleDelay::new(SYSCLK);

        // Setup GPIO
        let gpioa = cx.device.GPIOA.split(&mut rcc);
        let gpiob = cx.device.GPIOB.split(&mut rcc);

        let _buttons = (
            gpioa.pa0.into_pull_up_input(&cx.cs),
            gpioa.pa1.into_pull_up_input(&cx.cs),
            gpioa.pa2.into_pull_up_input(&cx.cs),
            gpioa.pa3.into_pull_up_input(&cx.cs),
        );
        let detector = gpioa.pa4.into_pull_up_input(&cx.cs).downgrade();
        let mut emitter = gpioa.pa5.into_push_pull_output(&cx.cs).downgrade();
        unwrap!(emitter.set_low());
        let tx_led = gpiob.pb3.into_push_pull_output(&cx.cs).downgrade();
        let rx_led = gpiob.pb4.into_push_pull_output(&cx.cs).downgrade();

        board::setup_exti(&cx.device.EXTI);

        // Setup DS18B20
        let mut pa12 = gpioa.pa12.into_open_drain_output(&cx.cs);
        unwrap!(pa12.set_high());
        let mut wire = unwrap!(OneWire::new(OpenDrainLine::new(pa12.downgrade())));

        let mut sensor = Ds18b20::new();
        match wire.read_rom(&mut delay) {
            Ok(address) => info!(
                "Found sensor: {}, family {=u8:#x}, serial {=u64:#x}",
                address,
                address.family_code(),
                address.serial()
            ),
            Err(e) => error!("No sensor: {}", e.as_str()),
        }
        match sensor.detect_power(&mut wire, &mut delay) {
            Ok(parasite) => debug!("Parasite power: {=bool}", parasite),
            Err(e) => error!("Power supply query failed: {}", e.as_str()),
        }

        // Setup IR link timers
        let mut beat_timer = Timer::tim3(cx.device.TIM3, Hertz(LINK.beat.raw()), &mut rcc);
        beat_timer.listen(Event::TimeOut);
        let sampler = SlotSampler::new(
            Timer::tim16(cx.device.TIM16, Hertz(LINK.half_beat().raw()), &mut rcc),
            &LINK,
        );

        // Setup channels
        let (temps, readings) = make_channel!(Temperature, 1);

        let _ = watchdog::spawn(cx.device.IWDG);
        let _ = acquisition::spawn();
        let _ = report::spawn(readings);

        (
            Shared {
                tx: Transmitter::new(&LINK),
                debounce: DebounceBank::new(&LINK),
                peer: PeerStateHolder::new(&LINK),
                rx: Receiver::new(),
                sampler,
                exti: cx.device.EXTI,
            },
            Local {
                beat_timer,
                tx_led,
                rx_led,
                detector,
                emitter,
                wire,
                sensor,
                delay,
                temps,
            },
        )
    }

    /// Carrier generator. Spins while the gate is open, sleeps otherwise.
    #[idle(local = [emitter])]
    fn idle(cx: idle::Context) -> ! {
        let mut delay = CycleDelay::new(SYSCLK);
        let half_period = LINK.carrier_half_period_us();
        let mut level = false;

        loop {
            unwrap!(CARRIER.step(cx.local.emitter, &mut level, &mut delay, half_period));
            if !CARRIER.is_on() {
                cortex_m::asm::wfi();
            }
        }
    }

    #[task(binds = TIM3, priority = 3, local = [beat_timer, tx_led], shared = [tx, debounce, peer])]
    fn beat(cx: beat::Context) {
        // Only clears the update flag; the interrupt means it already fired
        let _ = cx.local.beat_timer.wait();

        let (transmit, framing) = (cx.shared.tx, cx.shared.debounce, cx.shared.peer)
            .lock(|tx, debounce, peer| (ir::beat(tx, debounce, peer), tx.is_framing()));
        CARRIER.set(transmit);

        // Lit for the whole frame, not just the slots with carrier
        unwrap!(board::indicate(cx.local.tx_led, framing));
    }

    #[task(binds = EXTI0_1, priority = 3, shared = [tx, debounce, exti])]
    fn buttons_0_1(cx: buttons_0_1::Context) {
        let pending = board::take_pending(cx.shared.exti, BUTTON_LINES & 0b0011);
        (cx.shared.tx, cx.shared.debounce).lock(|tx, debounce| press(tx, debounce, pending));
    }

    #[task(binds = EXTI2_3, priority = 3, shared = [tx, debounce, exti])]
    fn buttons_2_3(cx: buttons_2_3::Context) {
        let pending = board::take_pending(cx.shared.exti, BUTTON_LINES & 0b1100);
        (cx.shared.tx, cx.shared.debounce).lock(|tx, debounce| press(tx, debounce, pending));
    }

    fn press(tx: &mut Transmitter, debounce: &mut DebounceBank, pending: u32) {
        for button in Button::ALL {
            if pending & (1 << button.index()) == 0 {
                continue;
            }
            if ir::press(tx, debounce, button) {
                debug!("Selected {}", button.state());
            } else {
                trace!("Bounce on {}", button);
            }
        }
    }

    #[task(binds = EXTI4_15, priority = 3, shared = [rx, sampler, exti])]
    fn detector_edge(cx: detector_edge::Context) {
        let exti = cx.shared.exti;
        if board::take_pending(exti, DETECTOR_LINE) == 0 {
            return;
        }

        trace!("Detector edge");
        let mut hw = RxBoard {
            exti,
            sampler: cx.shared.sampler,
        };
        cx.shared.rx.on_edge(&mut hw);
    }

    #[task(
        binds = TIM16,
        priority = 3,
        local = [detector, rx_led],
        shared = [rx, sampler, exti, peer]
    )]
    fn slot_sampler(mut cx: slot_sampler::Context) {
        cx.shared.sampler.acknowledge();
        let high = unwrap!(cx.local.detector.is_high());

        let rx = cx.shared.rx;
        let mut hw = RxBoard {
            exti: cx.shared.exti,
            sampler: cx.shared.sampler,
        };
        let (outcome, receiving) = cx.shared.peer.lock(|peer| {
            let outcome = ir::sample(rx, peer, high, &mut hw);
            (outcome, rx.is_receiving())
        });
        unwrap!(board::indicate(cx.local.rx_led, receiving));

        match outcome {
            Some(Ok(state)) => trace!("Peer sent {}", state),
            Some(Err(e)) => warn!("Frame dropped: {}", e),
            None => {}
        }
    }

    #[task(priority = 1, local = [wire, sensor, delay, temps])]
    async fn acquisition(cx: acquisition::Context) {
        crate::acquisition::acquisition(cx).await;
    }

    #[task(priority = 1, shared = [peer])]
    async fn report(
        mut cx: report::Context,
        mut readings: ChannelReceiver<'static, Temperature, 1>,
    ) {
        loop {
            let temp = match readings.recv().await {
                Ok(temp) => temp,
                Err(ReceiveError::Empty) => continue,
                Err(ReceiveError::NoSender) => unreachable!("Sender dropped"),
            };

            let (peer, shown) = cx.shared.peer.lock(|p| (p.peer(), p.display_code()));
            info!(
                "Temperature: {=f32}, peer: {}, display: {=u8}",
                temp.to_num::<f32>(),
                peer,
                shown
            );
        }
    }

    #[task(priority = 1)]
    async fn watchdog(_: watchdog::Context, wdg: IWDG) {
        let mut wdg = Watchdog::new(wdg);
        wdg.start(1.hz());

        loop {
            wdg.feed();
            Mono::delay(100.millis()).await;
        }
    }

    timestamp!("{=u64:us}", {
        Mono::now().duration_since_epoch().to_micros()
    });
}
