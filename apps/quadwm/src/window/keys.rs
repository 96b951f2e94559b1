//! Keysym names, modifier masks and the launcher's key translation.

use quadwm_config::KeySpec;
use quadwm_menu::Key;

pub const SHIFT: u16 = 1 << 0;
pub const LOCK: u16 = 1 << 1;
pub const CONTROL: u16 = 1 << 2;
pub const MOD1: u16 = 1 << 3;
/// Usually Num Lock.
pub const MOD2: u16 = 1 << 4;
pub const MOD4: u16 = 1 << 6;

/// Modifiers that take part in binding lookups. Lock, Num Lock and the
/// button bits are ignored.
pub const CLEAN_MASK: u16 = SHIFT | CONTROL | MOD1 | MOD4;

pub const XK_BACKSPACE: u32 = 0xff08;
pub const XK_TAB: u32 = 0xff09;
pub const XK_RETURN: u32 = 0xff0d;
pub const XK_ESCAPE: u32 = 0xff1b;
pub const XK_HOME: u32 = 0xff50;
pub const XK_LEFT: u32 = 0xff51;
pub const XK_UP: u32 = 0xff52;
pub const XK_RIGHT: u32 = 0xff53;
pub const XK_DOWN: u32 = 0xff54;
pub const XK_PRIOR: u32 = 0xff55;
pub const XK_NEXT: u32 = 0xff56;
pub const XK_END: u32 = 0xff57;
pub const XK_PRINT: u32 = 0xff61;
pub const XK_INSERT: u32 = 0xff63;
pub const XK_KP_ENTER: u32 = 0xff8d;
pub const XK_F1: u32 = 0xffbe;
pub const XK_DELETE: u32 = 0xffff;

pub fn clean(state: u16) -> u16 {
    state & CLEAN_MASK
}

/// The modifier mask a binding spec asks for.
pub fn modifier_mask(spec: &KeySpec) -> u16 {
    [('C', CONTROL), ('M', MOD1), ('4', MOD4), ('S', SHIFT)]
        .into_iter()
        .filter(|(letter, _)| spec.has_mod(*letter))
        .fold(0, |mask, (_, bit)| mask | bit)
}

/// Resolves a key name as written in the config to its keysym.
pub fn keysym_from_name(name: &str) -> Option<u32> {
    let special = match name {
        "Return" => XK_RETURN,
        "Escape" => XK_ESCAPE,
        "BackSpace" => XK_BACKSPACE,
        "Tab" => XK_TAB,
        "space" => 0x20,
        "Left" => XK_LEFT,
        "Up" => XK_UP,
        "Right" => XK_RIGHT,
        "Down" => XK_DOWN,
        "Home" => XK_HOME,
        "End" => XK_END,
        "Prior" | "Page_Up" => XK_PRIOR,
        "Next" | "Page_Down" => XK_NEXT,
        "Insert" => XK_INSERT,
        "Delete" => XK_DELETE,
        "Print" => XK_PRINT,
        "KP_Enter" => XK_KP_ENTER,
        "minus" => u32::from(b'-'),
        "equal" => u32::from(b'='),
        "plus" => u32::from(b'+'),
        "comma" => u32::from(b','),
        "period" => u32::from(b'.'),
        "slash" => u32::from(b'/'),
        "backslash" => u32::from(b'\\'),
        "semicolon" => u32::from(b';'),
        "apostrophe" => u32::from(b'\''),
        "grave" => u32::from(b'`'),
        "bracketleft" => u32::from(b'['),
        "bracketright" => u32::from(b']'),
        _ => 0,
    };
    if special != 0 {
        return Some(special);
    }

    if let Some(n) = name.strip_prefix('F').and_then(|n| n.parse::<u32>().ok()) {
        return (1..=12).contains(&n).then(|| XK_F1 + n - 1);
    }

    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        // bindings are looked up with the unshifted keysym
        (Some(c), None) if c.is_ascii_alphanumeric() => Some(u32::from(c.to_ascii_lowercase())),
        _ => None,
    }
}

/// Mouse buttons are written as their number.
pub fn button_from_name(name: &str) -> Option<u8> {
    name.parse().ok().filter(|b| (1..=5).contains(b))
}

/// Translates a key press inside the launcher. `keysym` is the unshifted
/// symbol and `shifted` the one to insert as text.
pub fn menu_key(keysym: u32, shifted: u32, state: u16) -> Option<Key> {
    match keysym {
        XK_UP => return Some(Key::Up),
        XK_DOWN => return Some(Key::Down),
        XK_BACKSPACE => return Some(Key::Backspace),
        XK_RETURN | XK_KP_ENTER => return Some(Key::Return),
        XK_ESCAPE => return Some(Key::Escape),
        _ => {}
    }
    if state & (CONTROL | MOD1 | MOD4) != 0 {
        return None;
    }
    keysym_to_char(shifted).map(Key::Char)
}

fn keysym_to_char(keysym: u32) -> Option<char> {
    match keysym {
        0x20..=0x7e | 0xa0..=0xff => char::from_u32(keysym),
        // Unicode keysyms carry the code point in the low 24 bits
        k if k & 0xff00_0000 == 0x0100_0000 => char::from_u32(k & 0x00ff_ffff),
        _ => None,
    }
}
