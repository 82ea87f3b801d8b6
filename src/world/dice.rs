//! Dice expressions of the form `NdM`, `NdM+K` or `NdM-K`.

use rand::Rng;

use crate::world::errors::WorldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dice {
    pub count: u32,
    pub sides: u32,
    pub modifier: i32,
}

impl Dice {
    pub const D10: Dice = Dice {
        count: 1,
        sides: 10,
        modifier: 0,
    };

    pub fn parse(expr: &str) -> Result<Self, WorldError> {
        let invalid = || WorldError::InvalidDice(expr.to_string());
        let text = expr.trim().to_ascii_lowercase();
        let (count, rest) = text.split_once('d').ok_or_else(invalid)?;
        let count = if count.is_empty() {
            1
        } else {
            count.parse::<u32>().map_err(|_| invalid())?
        };
        let (sides, modifier) = match rest.find(['+', '-']) {
            Some(pos) => {
                let modifier = rest[pos..].parse::<i32>().map_err(|_| invalid())?;
                (&rest[..pos], modifier)
            }
            None => (rest, 0),
        };
        let sides = sides.parse::<u32>().map_err(|_| invalid())?;
        if sides == 0 {
            return Err(invalid());
        }
        Ok(Self {
            count,
            sides,
            modifier,
        })
    }

    pub fn roll<R: Rng + ?Sized>(&self, rng: &mut R) -> i32 {
        let mut total: i32 = 0;
        for _ in 0..self.count {
            total = total.saturating_add(rng.gen_range(1..=self.sides) as i32);
        }
        total.saturating_add(self.modifier)
    }
}

/// Parse and roll in one go; malformed expressions roll zero.
pub fn roll_dice<R: Rng + ?Sized>(rng: &mut R, expr: &str) -> i32 {
    match Dice::parse(expr) {
        Ok(dice) => dice.roll(rng),
        Err(e) => {
            log::warn!("{}", e);
            0
        }
    }
}
