use std::time::{Duration, Instant};

use anyhow::Context;
use log::info;

use emu8_core::{Chip8, RandomSource, TIMER_HZ};

use crate::display::frame_to_text;

/// Keeps the CPU at its clock speed and spreads 60Hz timer ticks over its cycles.
///
/// Timer ticks are counted in emulated time, so a run that isn't throttled still sees
/// one tick per `hz / 60` instructions.
pub struct Pacer {
    hz: u64,
    cycles: u64,
    cycle_time: Duration,
    last_cycle: Instant,
    /// Whether or not the clock speed should be respected
    pub throttle: bool,
}

impl Pacer {
    pub fn new(hz: u64, throttle: bool) -> Self {
        Pacer {
            hz,
            cycles: 0,
            cycle_time: Duration::from_nanos(1_000_000_000 / hz),
            last_cycle: Instant::now(),
            throttle,
        }
    }

    /// Counts a cycle and returns how many timer ticks fell due during it.
    /// Below 60Hz that can be more than one.
    pub fn cycle(&mut self) -> u64 {
        let ticks = self.cycles * TIMER_HZ / self.hz;
        self.cycles += 1;
        self.cycles * TIMER_HZ / self.hz - ticks
    }

    /// Sleeps off whatever is left of the current cycle
    pub fn wait(&mut self) {
        let current_time = Instant::now();
        let elapsed_cycle_time = current_time - self.last_cycle;
        if self.throttle && self.cycle_time > elapsed_cycle_time {
            std::thread::sleep(self.cycle_time - elapsed_cycle_time);
        }
        self.last_cycle = Instant::now();
    }
}

/// Run one cycle and, when the host drives the timers, tick them on schedule
fn advance<R: RandomSource>(chip8: &mut Chip8<R>, pacer: &mut Pacer) -> anyhow::Result<()> {
    chip8.step()?;
    let ticks = pacer.cycle();
    if !chip8.config().timers_in_step {
        for _ in 0..ticks {
            chip8.tick_timers();
        }
    }
    pacer.wait();
    Ok(())
}

/// Runs `cycles` instructions without any display, then prints the screen.
/// The screen is printed even if the program faults part way through.
pub fn run_headless<R: RandomSource>(
    chip8: &mut Chip8<R>,
    mut pacer: Pacer,
    cycles: u64,
) -> anyhow::Result<()> {
    let mut outcome = Ok(());
    for _ in 0..cycles {
        outcome = advance(chip8, &mut pacer);
        if outcome.is_err() {
            break;
        }
    }

    let diagnostics = chip8.diagnostics();
    info!(
        "executed {} instructions ({} unrecognized)",
        diagnostics.cycles, diagnostics.unrecognized
    );
    print!("{}", frame_to_text(chip8.frame_buffer()));
    outcome.with_context(|| format!("program stopped at {:#06X}", chip8.pc()))
}

#[cfg(feature = "sdl")]
pub fn run_windowed<R: RandomSource>(
    chip8: &mut Chip8<R>,
    mut pacer: Pacer,
) -> anyhow::Result<()> {
    use sdl2::event::Event;
    use sdl2::keyboard::Keycode;

    use crate::display::Display;
    use crate::keymap::keymap;

    let sdl = sdl2::init().map_err(anyhow::Error::msg)?;
    let mut display = Display::new(&sdl)?;
    let mut events = sdl.event_pump().map_err(anyhow::Error::msg)?;

    'event: loop {
        // If the draw flag is set, unset it and render the current frame
        if let Some(frame) = chip8.get_frame() {
            display.render(frame)?;
        }

        for event in events.poll_iter() {
            match event {
                Event::Quit { .. } => break 'event,
                Event::KeyDown {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => chip8.key_press(kc)?,
                    (Keycode::Space, _) => pacer.throttle = false,
                    (Keycode::Escape, _) => break 'event,
                    _ => continue,
                },
                Event::KeyUp {
                    keycode: Some(key), ..
                } => match (key, keymap(key)) {
                    (_, Some(kc)) => chip8.key_release(kc)?,
                    (Keycode::Space, _) => pacer.throttle = true,
                    _ => continue,
                },
                _ => continue,
            };
        }

        advance(chip8, &mut pacer)
            .with_context(|| format!("program stopped at {:#06X}", chip8.pc()))?;
    }
    Ok(())
}
