//! Hungarian (Kuhn-Munkres) solver for the assignment problem.
//!
//! Finds a minimum-cost perfect matching on a square cost matrix using
//! starred and primed zeros. Ties are always broken row-major, so identical
//! input gives identical output.

use tracing::trace;

use crate::error::SolverError;
use crate::matrix::PaddedCostMatrix;

/// A permutation of columns over the rows of a square matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    columns: Vec<usize>,
    total_cost: f64,
}

impl Assignment {
    /// Column assigned to `row`.
    pub fn column_for(&self, row: usize) -> usize {
        self.columns[row]
    }

    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Sum of the original matrix values at the assigned cells.
    pub fn total_cost(&self) -> f64 {
        self.total_cost
    }

    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.columns.iter().copied().enumerate()
    }

    /// Pairs where neither side is padding.
    pub fn real_pairs(
        &self,
        real_rows: usize,
        real_cols: usize,
    ) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.pairs()
            .filter(move |&(row, col)| row < real_rows && col < real_cols)
    }
}

/// Solves a square cost matrix built from nested rows.
pub fn solve_rows(rows: &[Vec<f64>]) -> Result<Assignment, SolverError> {
    let matrix = PaddedCostMatrix::from_square(rows.to_vec())?;
    solve(&matrix)
}

/// Minimum-cost perfect matching of `matrix`.
pub fn solve(matrix: &PaddedCostMatrix) -> Result<Assignment, SolverError> {
    matrix.validate()?;

    let size = matrix.size();
    if size == 0 {
        return Ok(Assignment {
            columns: Vec::new(),
            total_cost: 0.0,
        });
    }

    let mut state = Munkres::new(matrix);
    state.reduce_rows();
    state.star_initial_zeros();
    state.run()?;

    let mut columns = Vec::with_capacity(size);
    for row in 0..size {
        let col = state.star_in_row[row].ok_or(SolverError::Divergence {
            iterations: state.iterations,
        })?;
        columns.push(col);
    }

    let total_cost = columns
        .iter()
        .enumerate()
        .map(|(row, &col)| matrix.get(row, col))
        .sum();

    Ok(Assignment {
        columns,
        total_cost,
    })
}

struct Munkres {
    size: usize,
    /// Working copy, reduced in place.
    cost: Vec<f64>,
    /// Tolerance for treating a reduced cell as zero.
    epsilon: f64,
    star_in_row: Vec<Option<usize>>,
    star_in_col: Vec<Option<usize>>,
    prime_in_row: Vec<Option<usize>>,
    row_covered: Vec<bool>,
    col_covered: Vec<bool>,
    iterations: usize,
}

impl Munkres {
    fn new(matrix: &PaddedCostMatrix) -> Self {
        let size = matrix.size();
        let cost: Vec<f64> = (0..size).flat_map(|row| matrix.row(row).to_vec()).collect();
        let max = cost.iter().copied().fold(1.0_f64, f64::max);

        Self {
            size,
            cost,
            epsilon: max * 1e-9,
            star_in_row: vec![None; size],
            star_in_col: vec![None; size],
            prime_in_row: vec![None; size],
            row_covered: vec![false; size],
            col_covered: vec![false; size],
            iterations: 0,
        }
    }

    fn at(&self, row: usize, col: usize) -> f64 {
        self.cost[row * self.size + col]
    }

    fn is_zero(&self, row: usize, col: usize) -> bool {
        self.at(row, col).abs() <= self.epsilon
    }

    fn reduce_rows(&mut self) {
        for row in 0..self.size {
            let cells = &mut self.cost[row * self.size..(row + 1) * self.size];
            let min = cells.iter().copied().fold(f64::INFINITY, f64::min);
            for cell in cells.iter_mut() {
                *cell -= min;
            }
        }
    }

    fn star_initial_zeros(&mut self) {
        for row in 0..self.size {
            for col in 0..self.size {
                if self.is_zero(row, col)
                    && self.star_in_row[row].is_none()
                    && self.star_in_col[col].is_none()
                {
                    self.star(row, col);
                }
            }
        }
    }

    fn star(&mut self, row: usize, col: usize) {
        self.star_in_row[row] = Some(col);
        self.star_in_col[col] = Some(row);
    }

    fn run(&mut self) -> Result<(), SolverError> {
        // Every augmentation adds one starred zero, so `size` of them suffice.
        for _ in 0..=self.size {
            if self.cover_starred_columns() == self.size {
                return Ok(());
            }
            self.augment_once()?;
        }

        Err(SolverError::Divergence {
            iterations: self.iterations,
        })
    }

    fn cover_starred_columns(&mut self) -> usize {
        let mut covered = 0;
        for col in 0..self.size {
            self.col_covered[col] = self.star_in_col[col].is_some();
            if self.col_covered[col] {
                covered += 1;
            }
        }
        covered
    }

    /// Primes zeros and adjusts the matrix until an augmenting path exists,
    /// then flips it.
    fn augment_once(&mut self) -> Result<(), SolverError> {
        // Each adjustment uncovers a new zero, which either covers a row or
        // ends the search, so more than size² + size rounds means trouble.
        let limit = self.size * self.size + self.size;
        let mut adjustments = 0;

        loop {
            self.iterations += 1;

            match self.find_uncovered_zero() {
                Some((row, col)) => {
                    self.prime_in_row[row] = Some(col);
                    match self.star_in_row[row] {
                        Some(star_col) => {
                            self.row_covered[row] = true;
                            self.col_covered[star_col] = false;
                        }
                        None => return self.flip_path(row, col),
                    }
                }
                None => {
                    adjustments += 1;
                    if adjustments > limit {
                        return Err(SolverError::Divergence {
                            iterations: self.iterations,
                        });
                    }
                    self.adjust();
                }
            }
        }
    }

    fn find_uncovered_zero(&self) -> Option<(usize, usize)> {
        for row in 0..self.size {
            if self.row_covered[row] {
                continue;
            }
            for col in 0..self.size {
                if !self.col_covered[col] && self.is_zero(row, col) {
                    return Some((row, col));
                }
            }
        }
        None
    }

    /// Adds the smallest uncovered value to covered rows and subtracts it from
    /// uncovered columns.
    fn adjust(&mut self) {
        let mut delta = f64::INFINITY;
        for row in (0..self.size).filter(|&row| !self.row_covered[row]) {
            for col in (0..self.size).filter(|&col| !self.col_covered[col]) {
                delta = delta.min(self.at(row, col));
            }
        }
        trace!(delta, "adjusting reduced matrix");

        for row in 0..self.size {
            for col in 0..self.size {
                let cell = &mut self.cost[row * self.size + col];
                if self.row_covered[row] {
                    *cell += delta;
                }
                if !self.col_covered[col] {
                    *cell -= delta;
                }
            }
        }
    }

    /// Walks prime → star in column → prime in row, then swaps stars and primes.
    fn flip_path(&mut self, row: usize, col: usize) -> Result<(), SolverError> {
        let mut primes = vec![(row, col)];
        let mut stars = Vec::new();
        let mut col = col;

        while let Some(star_row) = self.star_in_col[col] {
            stars.push((star_row, col));
            // A starred zero in an uncovered column only exists if its row was
            // covered after priming a zero in it.
            let prime_col = self.prime_in_row[star_row].ok_or(SolverError::Divergence {
                iterations: self.iterations,
            })?;
            primes.push((star_row, prime_col));
            col = prime_col;
        }

        for &(star_row, star_col) in &stars {
            self.star_in_row[star_row] = None;
            self.star_in_col[star_col] = None;
        }
        for &(prime_row, prime_col) in &primes {
            self.star(prime_row, prime_col);
        }

        self.prime_in_row.fill(None);
        self.row_covered.fill(false);
        self.col_covered.fill(false);
        Ok(())
    }
}
