//! Temperature acquisition task

use core::convert::Infallible;

use defmt::*;
use irthermo::{onewire::Error, thermometer::Temperature};
use rtic_monotonics::{
    stm32::{Tim2 as Mono, *},
    Monotonic,
};

/// Time between the starts of two readings
const PERIOD_MS: u64 = 2_000;

#[allow(clippy::needless_lifetimes, reason = "clippy bug")]
#[cfg_attr(feature = "sizing", inline(never))]
pub async fn acquisition<'a>(mut cx: crate::app::acquisition::Context<'a>) {
    let mut now = Mono::now();

    loop {
        trace!("acquisition");

        match acquire(&mut cx).await {
            Ok(temp) => {
                if cx.local.temps.try_send(temp).is_err() {
                    warn!("Reading dropped, report is behind");
                }
            }
            Err(e) => error!("Error reading sensor: {}", e.as_str()),
        }

        now += PERIOD_MS.millis();
        Mono::delay_until(now).await;
    }
}

/// One reading; the conversion wait yields to the other tasks
async fn acquire<'a>(
    cx: &mut crate::app::acquisition::Context<'a>,
) -> Result<Temperature, Error<Infallible>> {
    let sensor = &*cx.local.sensor;
    let wire = &mut *cx.local.wire;
    let delay = &mut *cx.local.delay;

    sensor.start_conversion(wire, delay)?;

    let wait = u64::from(sensor.configured_resolution().conversion_time());
    Mono::delay(wait.millis()).await;

    let temp = sensor.read_temperature(wire, delay)?;
    debug!("Temperature: {=f32}", temp.to_num::<f32>());
    Ok(temp)
}
