/// # Quirks
/// Points where historical interpreters disagree about what an instruction does.
///
/// The defaults describe the behavior of the interpreter this one was modelled on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    /// `SHR`/`SHL` read Vy and store the shifted value in Vx, as the COSMAC VIP did.
    /// When unset the shifts operate on Vx alone.
    pub shift_reads_vy: bool,

    /// Sprite pixels that cross the right or bottom edge are dropped instead of wrapping
    /// around to the opposite edge. The sprite origin wraps either way.
    pub clip_sprites: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub quirks: Quirks,

    /// Decrement the timers at the end of every `step`.
    /// Turn this off when the host calls `tick_timers` on its own 60Hz schedule.
    pub timers_in_step: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            quirks: Quirks::default(),
            timers_in_step: true,
        }
    }
}
