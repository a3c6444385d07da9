//! Padded per-cell, per-direction amplitude storage.
//!
//! A field of interior side `N` stores `(N + 2)²` cells, each holding
//! [`DIRECTIONS`] amplitudes. Index `0` and `N + 1` along either axis are the
//! padding ring; interior cell `i` lives at padded index `i + 1`.

use wavegrid_common::{DIRECTIONS, WaveError};

/// Entries in a padded table of interior side `resolution` with `per_cell`
/// entries per cell. Overflow reports as an allocation failure.
pub(crate) fn padded_len(
    resolution: usize,
    per_cell: usize,
    what: &'static str,
) -> Result<usize, WaveError> {
    resolution
        .checked_add(2)
        .and_then(|side| side.checked_mul(side))
        .and_then(|cells| cells.checked_mul(per_cell))
        .ok_or(WaveError::ResourceAllocationFailure {
            what,
            bytes: usize::MAX,
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeField {
    resolution: usize,
    side: usize,
    data: Vec<f32>,
}

impl AmplitudeField {
    /// Zeroed field with interior side `resolution`.
    pub fn new(resolution: usize) -> Result<Self, WaveError> {
        let what = "amplitude field";
        let len = padded_len(resolution, DIRECTIONS, what)?;
        let side = resolution + 2;
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| WaveError::ResourceAllocationFailure {
                what,
                bytes: len.saturating_mul(std::mem::size_of::<f32>()),
            })?;
        data.resize(len, 0.0);
        Ok(Self {
            resolution,
            side,
            data,
        })
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Padded side, `resolution + 2`.
    pub fn side(&self) -> usize {
        self.side
    }

    /// Floats per padded row.
    pub fn row_len(&self) -> usize {
        self.side * DIRECTIONS
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize, d: usize) -> usize {
        (y * self.side + x) * DIRECTIONS + d
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize, d: usize) -> f32 {
        self.data[self.index(x, y, d)]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, d: usize, value: f32) {
        let i = self.index(x, y, d);
        self.data[i] = value;
    }

    #[inline]
    pub fn add(&mut self, x: usize, y: usize, d: usize, value: f32) {
        let i = self.index(x, y, d);
        self.data[i] += value;
    }

    /// All [`DIRECTIONS`] amplitudes of padded cell `(x, y)`.
    pub fn cell(&self, x: usize, y: usize) -> &[f32] {
        let i = self.index(x, y, 0);
        &self.data[i..i + DIRECTIONS]
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn is_released(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_border(&self, x: usize, y: usize) -> bool {
        x == 0 || y == 0 || x == self.side - 1 || y == self.side - 1
    }

    /// Bilinear sample at continuous padded coordinates, clamped to the padded extent.
    pub fn sample(&self, u: f32, v: f32, d: usize) -> f32 {
        let max = (self.side - 1) as f32;
        let u = u.clamp(0.0, max);
        let v = v.clamp(0.0, max);
        let x0 = u.floor() as usize;
        let y0 = v.floor() as usize;
        let x1 = (x0 + 1).min(self.side - 1);
        let y1 = (y0 + 1).min(self.side - 1);
        let fx = u - x0 as f32;
        let fy = v - y0 as f32;

        let a = self.get(x0, y0, d);
        let b = self.get(x1, y0, d);
        let c = self.get(x0, y1, d);
        let e = self.get(x1, y1, d);
        let top = a + (b - a) * fx;
        let bottom = c + (e - c) * fx;
        top + (bottom - top) * fy
    }

    /// Write `values` into every padding cell (inflow boundary).
    pub fn fill_border(&mut self, values: &[f32; DIRECTIONS]) {
        let last = self.side - 1;
        for x in 0..self.side {
            self.write_cell(x, 0, values);
            self.write_cell(x, last, values);
        }
        for y in 1..last {
            self.write_cell(0, y, values);
            self.write_cell(last, y, values);
        }
    }

    /// Copy each padding cell from its nearest interior cell.
    pub fn refresh_border(&mut self) {
        let n = self.resolution;
        let last = self.side - 1;
        let copy = |field: &mut Self, x: usize, y: usize| {
            let src = field.index(x.clamp(1, n), y.clamp(1, n), 0);
            let dst = field.index(x, y, 0);
            field.data.copy_within(src..src + DIRECTIONS, dst);
        };
        for x in 0..self.side {
            copy(self, x, 0);
            copy(self, x, last);
        }
        for y in 1..last {
            copy(self, 0, y);
            copy(self, last, y);
        }
    }

    /// Sum over interior cells and all directions.
    pub fn total(&self) -> f64 {
        (1..=self.resolution)
            .flat_map(|y| (1..=self.resolution).map(move |x| (x, y)))
            .map(|(x, y)| self.cell(x, y).iter().map(|&a| f64::from(a)).sum::<f64>())
            .sum()
    }

    pub fn clear(&mut self) {
        self.data.fill(0.0);
    }

    /// Drop the backing storage; the field is unusable afterwards.
    pub fn release(&mut self) {
        self.data = Vec::new();
    }

    fn write_cell(&mut self, x: usize, y: usize, values: &[f32; DIRECTIONS]) {
        let i = self.index(x, y, 0);
        self.data[i..i + DIRECTIONS].copy_from_slice(values);
    }
}

/// Two equally sized fields; a pass reads `front` and writes `back`, or the reverse.
#[derive(Debug, Clone)]
pub struct PingPong {
    pub front: AmplitudeField,
    pub back: AmplitudeField,
}

impl PingPong {
    pub fn new(resolution: usize) -> Result<Self, WaveError> {
        Ok(Self {
            front: AmplitudeField::new(resolution)?,
            back: AmplitudeField::new(resolution)?,
        })
    }

    pub fn release(&mut self) {
        self.front.release();
        self.back.release();
    }
}
