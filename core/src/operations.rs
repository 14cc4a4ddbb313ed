use crate::config::Quirks;
use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH, FLAG, FONT_START, GLYPH_SIZE, MEMORY_SIZE};
use crate::errors::Fault;
use crate::random::RandomSource;
use crate::state::{Keypad, State};

// Every operation runs after the fetch has moved pc on to the next instruction,
// so "skip" means one more +2 and nothing here advances pc otherwise.

fn with_register(state: &State, x: u8, value: u8) -> State {
    let mut v = state.v;
    v[x as usize] = value;
    State { v, ..*state }
}

/// VF is written before Vx so that a result destined for VF wins
fn with_flagged(state: &State, x: u8, value: u8, flag: bool) -> State {
    let mut v = state.v;
    v[FLAG] = u8::from(flag);
    v[x as usize] = value;
    State { v, ..*state }
}

fn skip_if(state: &State, condition: bool) -> State {
    let pc = if condition {
        state.pc.wrapping_add(0x2)
    } else {
        state.pc
    };
    State { pc, ..*state }
}

/// pc may only move to an even address with room for a whole instruction
fn branch_target(state: &State, target: u16) -> Result<u16, Fault> {
    if target as usize > MEMORY_SIZE - 2 {
        return Err(state.out_of_range(target as usize));
    }
    if target % 2 != 0 {
        return Err(state.misaligned(target));
    }
    Ok(target)
}

fn is_pressed(keys: &Keypad, key: u8) -> bool {
    // Values past 0xF name keys that don't exist, which are never down
    keys.get(key as usize).copied().unwrap_or(false)
}

/// clear
pub fn clear(state: &State) -> Result<State, Fault> {
    Ok(State {
        frame_buffer: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        draw_flag: true,
        ..*state
    })
}

/// PC = STACK.pop()
pub fn ret(state: &State) -> Result<State, Fault> {
    let mut next = *state;
    let addr = next.pop()?;
    next.pc = branch_target(state, addr)?;
    Ok(next)
}

/// PC = addr
pub fn jump(state: &State, addr: u16) -> Result<State, Fault> {
    Ok(State {
        pc: branch_target(state, addr)?,
        ..*state
    })
}

/// STACK.push(PC); PC = addr
pub fn call(state: &State, addr: u16) -> Result<State, Fault> {
    let mut next = *state;
    next.push(state.pc)?;
    next.pc = branch_target(state, addr)?;
    Ok(next)
}

/// if Vx == nn then skip
pub fn skip_eq_imm(state: &State, x: u8, nn: u8) -> Result<State, Fault> {
    Ok(skip_if(state, state.v[x as usize] == nn))
}

/// if Vx != nn then skip
pub fn skip_ne_imm(state: &State, x: u8, nn: u8) -> Result<State, Fault> {
    Ok(skip_if(state, state.v[x as usize] != nn))
}

/// if Vx == Vy then skip
pub fn skip_eq_reg(state: &State, x: u8, y: u8) -> Result<State, Fault> {
    Ok(skip_if(state, state.v[x as usize] == state.v[y as usize]))
}

/// if Vx != Vy then skip
pub fn skip_ne_reg(state: &State, x: u8, y: u8) -> Result<State, Fault> {
    Ok(skip_if(state, state.v[x as usize] != state.v[y as usize]))
}

/// Vx = nn
pub fn load_imm(state: &State, x: u8, nn: u8) -> Result<State, Fault> {
    Ok(with_register(state, x, nn))
}

/// Vx += nn
/// Wraps on overflow and leaves VF alone
pub fn add_imm(state: &State, x: u8, nn: u8) -> Result<State, Fault> {
    Ok(with_register(state, x, state.v[x as usize].wrapping_add(nn)))
}

/// Vx = Vy
pub fn mov(state: &State, x: u8, y: u8) -> Result<State, Fault> {
    Ok(with_register(state, x, state.v[y as usize]))
}

/// Vx |= Vy
pub fn or(state: &State, x: u8, y: u8) -> Result<State, Fault> {
    Ok(with_register(state, x, state.v[x as usize] | state.v[y as usize]))
}

/// Vx &= Vy
pub fn and(state: &State, x: u8, y: u8) -> Result<State, Fault> {
    Ok(with_register(state, x, state.v[x as usize] & state.v[y as usize]))
}

/// Vx ^= Vy
pub fn xor(state: &State, x: u8, y: u8) -> Result<State, Fault> {
    Ok(with_register(state, x, state.v[x as usize] ^ state.v[y as usize]))
}

/// Vx += Vy; VF = carry
pub fn add_reg(state: &State, x: u8, y: u8) -> Result<State, Fault> {
    let (sum, carry) = state.v[x as usize].overflowing_add(state.v[y as usize]);
    Ok(with_flagged(state, x, sum, carry))
}

/// Vx -= Vy; VF = !borrow
pub fn sub(state: &State, x: u8, y: u8) -> Result<State, Fault> {
    let (vx, vy) = (state.v[x as usize], state.v[y as usize]);
    Ok(with_flagged(state, x, vx.wrapping_sub(vy), vx >= vy))
}

/// Vx = Vy - Vx; VF = !borrow
pub fn sub_reverse(state: &State, x: u8, y: u8) -> Result<State, Fault> {
    let (vx, vy) = (state.v[x as usize], state.v[y as usize]);
    Ok(with_flagged(state, x, vy.wrapping_sub(vx), vy >= vx))
}

fn shift_source(state: &State, x: u8, y: u8, quirks: Quirks) -> u8 {
    if quirks.shift_reads_vy {
        state.v[y as usize]
    } else {
        state.v[x as usize]
    }
}

/// Vx >>= 1; VF = bit shifted out
pub fn shift_right(state: &State, x: u8, y: u8, quirks: Quirks) -> Result<State, Fault> {
    let source = shift_source(state, x, y, quirks);
    Ok(with_flagged(state, x, source >> 1, source & 0x01 != 0))
}

/// Vx <<= 1; VF = bit shifted out
pub fn shift_left(state: &State, x: u8, y: u8, quirks: Quirks) -> Result<State, Fault> {
    let source = shift_source(state, x, y, quirks);
    Ok(with_flagged(state, x, source << 1, source & 0x80 != 0))
}

/// I = addr
pub fn load_index(state: &State, addr: u16) -> Result<State, Fault> {
    Ok(State { i: addr, ..*state })
}

/// PC = V0 + addr
pub fn jump_offset(state: &State, addr: u16) -> Result<State, Fault> {
    let target = addr + u16::from(state.v[0x0]);
    Ok(State {
        pc: branch_target(state, target)?,
        ..*state
    })
}

/// Vx = random_byte & mask
pub fn random(
    state: &State,
    x: u8,
    mask: u8,
    source: &mut dyn RandomSource,
) -> Result<State, Fault> {
    Ok(with_register(state, x, source.next_byte() & mask))
}

/// draw_sprite(x=Vx y=Vy height=n)
/// XORs the sprite stored at I..I+n onto the FrameBuffer at Vx, Vy.
///
/// The origin always wraps onto the screen; pixels running off the right or bottom edge
/// wrap too unless `clip_sprites` is set. VF is set if any lit pixel was turned off.
pub fn draw(state: &State, x: u8, y: u8, height: u8, quirks: Quirks) -> Result<State, Fault> {
    let sprite = state.read(state.i, height as usize)?;
    let origin_x = state.v[x as usize] as usize % DISPLAY_WIDTH;
    let origin_y = state.v[y as usize] as usize % DISPLAY_HEIGHT;

    let mut v = state.v;
    let mut frame_buffer = state.frame_buffer;
    v[FLAG] = 0x0;

    for (row, byte) in sprite.iter().enumerate() {
        let mut py = origin_y + row;
        if py >= DISPLAY_HEIGHT {
            if quirks.clip_sprites {
                break;
            }
            py %= DISPLAY_HEIGHT;
        }

        for bit in 0..8 {
            if byte & (0x80u8 >> bit) == 0 {
                continue;
            }
            let mut px = origin_x + bit;
            if px >= DISPLAY_WIDTH {
                if quirks.clip_sprites {
                    break;
                }
                px %= DISPLAY_WIDTH;
            }

            let pixel = &mut frame_buffer[py][px];
            if *pixel {
                v[FLAG] = 0x1;
            }
            *pixel = !*pixel;
        }
    }

    Ok(State {
        v,
        frame_buffer,
        draw_flag: true,
        ..*state
    })
}

/// if key Vx is down then skip
pub fn skip_key_pressed(state: &State, x: u8, keys: &Keypad) -> Result<State, Fault> {
    Ok(skip_if(state, is_pressed(keys, state.v[x as usize])))
}

/// if key Vx is up then skip
pub fn skip_key_released(state: &State, x: u8, keys: &Keypad) -> Result<State, Fault> {
    Ok(skip_if(state, !is_pressed(keys, state.v[x as usize])))
}

/// Vx = DT
pub fn load_delay(state: &State, x: u8) -> Result<State, Fault> {
    Ok(with_register(state, x, state.delay_timer))
}

/// Vx = lowest pressed key
/// With nothing pressed pc is wound back so this instruction runs again next cycle.
pub fn wait_key(state: &State, x: u8, keys: &Keypad) -> Result<State, Fault> {
    match keys.iter().position(|&pressed| pressed) {
        Some(key) => Ok(with_register(state, x, key as u8)),
        None => Ok(State {
            pc: state.pc.wrapping_sub(0x2),
            ..*state
        }),
    }
}

/// DT = Vx
pub fn set_delay(state: &State, x: u8) -> Result<State, Fault> {
    Ok(State {
        delay_timer: state.v[x as usize],
        ..*state
    })
}

/// ST = Vx
pub fn set_sound(state: &State, x: u8) -> Result<State, Fault> {
    Ok(State {
        sound_timer: state.v[x as usize],
        ..*state
    })
}

/// I += Vx
/// No flag; an index past the end of memory faults when it is used
pub fn add_index(state: &State, x: u8) -> Result<State, Fault> {
    Ok(State {
        i: state.i.wrapping_add(u16::from(state.v[x as usize])),
        ..*state
    })
}

/// I = address of the glyph for the low nibble of Vx
pub fn load_glyph(state: &State, x: u8) -> Result<State, Fault> {
    let digit = u16::from(state.v[x as usize] & 0x0F);
    Ok(State {
        i: FONT_START + digit * GLYPH_SIZE,
        ..*state
    })
}

/// mem[I..I+3] = bcd(Vx)
pub fn store_bcd(state: &State, x: u8) -> Result<State, Fault> {
    let value = state.v[x as usize];
    let mut next = *state;
    next.write(state.i, &[value / 100, value / 10 % 10, value % 10])?;
    Ok(next)
}

/// mem[I..=I+x] = V0..=Vx
pub fn store_registers(state: &State, x: u8) -> Result<State, Fault> {
    let mut next = *state;
    next.write(state.i, &state.v[..=x as usize])?;
    Ok(next)
}

/// V0..=Vx = mem[I..=I+x]
pub fn load_registers(state: &State, x: u8) -> Result<State, Fault> {
    let bytes = state.read(state.i, x as usize + 1)?;
    let mut v = state.v;
    v[..=x as usize].copy_from_slice(bytes);
    Ok(State { v, ..*state })
}
