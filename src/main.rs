#![no_std]
#![no_main]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::wildcard_imports)]

use defmt_rtt as _;
use panic_probe as _;
use rtic_fan::{config::Config, ds18b20::Resolution};
use static_assertions::const_assert;

/// Sensors tracked on the bus. Only the first is used for control.
const MAX_SENSORS: usize = 4;
const RESOLUTION: Resolution = Resolution::Bits12;
const CONFIG: Config = Config::DEFAULT;

// The settle wait must cover a full conversion
const_assert!(RESOLUTION.conversion_time() as u32 <= CONFIG.sampler.settle.to_millis());

#[rtic::app(device = stm32f0xx_hal::pac)]
mod app {
    use defmt::{panic, *};
    use rtic_fan::{
        onewire::OneWire, thermometer::ds18b20::Ds18b20Thermometer, Actuator, ControlLoop,
        PidController, PwmFan, Sampler,
    };
    use rtic_monotonics::{
        stm32::{Tim2 as Mono, *},
        Monotonic,
    };
    use stm32f0xx_hal::{
        delay::Delay,
        gpio::{OpenDrain, Output, Pin},
        pac::TIM3,
        prelude::*,
        pwm::{self, PwmChannels, C1},
    };

    use crate::{CONFIG, MAX_SENSORS, RESOLUTION};

    type Sensors = Ds18b20Thermometer<Pin<Output<OpenDrain>>, MAX_SENSORS>;
    type Fan = PwmFan<PwmChannels<TIM3, C1>>;
    type FanLoop = ControlLoop<Sensors, Delay, PidController, Fan>;

    #[shared]
    struct Shared {}

    #[local]
    struct Local {
        control: FanLoop,
    }

    #[init]
    fn init(mut cx: init::Context) -> (Shared, Local) {
        if let Err(e) = CONFIG.validate() {
            panic!("Invalid configuration: {=str}", e.as_str());
        }

        // Set system clock to 24 MHz
        let mut rcc = cx
            .device
            .RCC
            .configure()
            .hsi48()
            .sysclk(24.mhz())
            .pclk(24.mhz())
            .hclk(24.mhz())
            .freeze(&mut cx.device.FLASH);

        trace!("sysclk: {}", rcc.clocks.sysclk().0);

        // TIM2 only timestamps the logs
        let token = rtic_monotonics::create_stm32_tim2_monotonic_token!();
        Mono::start(24_000_000, token);

        // SysTick paces both the 1-Wire slots and the control loop
        let mut delay = Delay::new(cx.core.SYST, &rcc);

        let gpioa = cx.device.GPIOA.split(&mut rcc);
        let gpiob = cx.device.GPIOB.split(&mut rcc);

        // Fan PWM on PB4 (TIM3_CH1)
        let pb4 = gpiob.pb4.into_alternate_af1(&cx.cs);
        let ch1 = pwm::tim3(
            cx.device.TIM3,
            pb4,
            &mut rcc,
            CONFIG.pwm.frequency.to_Hz().hz(),
        );
        let mut actuator = Actuator::new(
            PwmFan::new(ch1, CONFIG.actuator.max_duty),
            CONFIG.actuator,
        );
        actuator
            .configure(CONFIG.pwm.initial_duty)
            .unwrap_or_else(|e| match e {});

        // DS18B20 on PA12
        let mut pa12 = gpioa.pa12.into_open_drain_output(&cx.cs);
        unwrap!(pa12.set_high());
        let mut sensors = Sensors::new(OneWire::new(pa12.downgrade()), RESOLUTION);

        match sensors.discover(&mut delay) {
            Ok(0) => error!("No DS18B20 on the bus"),
            Ok(n) => info!("{=usize} DS18B20 sensor(s) ready", n),
            Err(e) => error!("Sensor search failed: {=str}", e.as_str()),
        }

        let sampler = Sampler::new(sensors, delay, CONFIG.sampler);
        let pid = PidController::new(CONFIG.pid);
        let control = ControlLoop::new(
            sampler,
            pid,
            actuator,
            pid.initial_state(),
            CONFIG.fault_policy,
        );

        info!("Fan control starting");

        (Shared {}, Local { control })
    }

    #[idle(local = [control])]
    fn idle(cx: idle::Context) -> ! {
        cx.local.control.run()
    }

    timestamp!("{=u64:us}", {
        Mono::now().duration_since_epoch().to_micros()
    });
}
