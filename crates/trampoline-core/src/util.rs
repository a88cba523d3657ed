//! Coordinate and block helpers shared by the relocation policies.

use rand::Rng;
use trampoline_api::{BlockPos, Location, ServerApi};

/// Section sign used by the client for formatting codes.
pub const COLOR_CHAR: char = '\u{00A7}';

/// Uniform random integer in `[min, max]`. Returns `min` if the range is empty.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, min: i32, max: i32) -> i32 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

/// -1, 0 or +1.
pub fn sign(x: i32) -> i32 {
    x.signum()
}

/// The location moved to the centre of its block in the XZ plane.
pub fn centred_xz(loc: &Location) -> Location {
    Location::new(
        loc.world.clone(),
        loc.x.floor() + 0.5,
        loc.y,
        loc.z.floor() + 0.5,
    )
}

/// Highest block in the column that an entity cannot pass through.
///
/// Scans down from the highest non-air block. `None` means the column is
/// passable all the way down into the void (or the world is not loaded).
pub fn highest_unpassable_block(
    api: &dyn ServerApi,
    world: &str,
    x: i32,
    z: i32,
) -> Option<BlockPos> {
    let info = api.world_info(world)?;
    let mut y = api.highest_block_y(world, x, z)?.min(info.max_y);
    while y >= info.min_y {
        let pos = BlockPos::new(x, y, z);
        if !api.block_at(world, pos).is_passable() {
            return Some(pos);
        }
        y -= 1;
    }
    None
}

/// Location standing on top of `block`.
pub fn atop(world: &str, block: BlockPos) -> Location {
    Location::of_block(world, block.above())
}

/// `loc` if both its feet and head blocks are passable, otherwise the top of
/// the highest solid block at the same X and Z. A column that is void all the
/// way down leaves `loc` unchanged.
pub fn passable_spawn_location(api: &dyn ServerApi, loc: Location) -> Location {
    let feet = loc.block_pos();
    let head = feet.above();
    if api.block_at(&loc.world, feet).is_passable() && api.block_at(&loc.world, head).is_passable()
    {
        return loc;
    }
    match highest_unpassable_block(api, &loc.world, feet.x, feet.z) {
        Some(ground) => atop(&loc.world, ground),
        None => loc,
    }
}

/// Replace `alt` followed by a formatting code character with the section sign.
pub fn translate_color_codes(alt: char, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == alt {
            if let Some(&next) = chars.peek() {
                if "0123456789abcdefklmnorx".contains(next.to_ascii_lowercase()) {
                    out.push(COLOR_CHAR);
                    out.push(next.to_ascii_lowercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// `(world, x, y, z)` with one decimal place.
pub fn format_location(loc: &Location) -> String {
    format!(
        "({},{:5.1},{:5.1},{:5.1})",
        loc.world, loc.x, loc.y, loc.z
    )
}

/// `(world,x,y,z)` in block coordinates.
pub fn format_block_location(loc: &Location) -> String {
    format!(
        "({},{},{},{})",
        loc.world,
        loc.block_x(),
        loc.block_y(),
        loc.block_z()
    )
}
