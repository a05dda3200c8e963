//! Page planning.
//!
//! Blocks are packed greedily, left to right, into pages of usable width
//! `max_width`. A block takes `max(1, circuits) * column_width + gap`.
//! Blocks are never split; a block wider than a page gets a page of its
//! own. A panel without blocks still yields one empty page.

use std::ops::Range;

use super::blocks::DifferentialBlock;

/// Geometry the planner needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub column_width: f64,
    pub gap: f64,
    pub max_width: f64,
}

impl PageLayout {
    pub fn block_width(&self, column_count: usize) -> f64 {
        column_count.max(1) as f64 * self.column_width + self.gap
    }
}

/// A contiguous run of blocks sharing one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedPage {
    pub blocks: Range<usize>,
    pub used_width: f64,
}

impl PlannedPage {
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }
}

pub struct PageLayoutPlanner {
    layout: PageLayout,
}

impl PageLayoutPlanner {
    pub fn new(layout: PageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    /// Plan pages for a panel's blocks.
    pub fn plan(&self, blocks: &[DifferentialBlock<'_>]) -> Vec<PlannedPage> {
        let widths: Vec<f64> = blocks
            .iter()
            .map(|b| self.layout.block_width(b.circuit_count()))
            .collect();
        self.plan_widths(&widths)
    }

    /// Plan pages for blocks of the given widths.
    pub fn plan_widths(&self, widths: &[f64]) -> Vec<PlannedPage> {
        let max = self.layout.max_width;
        let mut pages = Vec::new();
        let mut start = 0;
        let mut used = 0.0;

        for (i, &width) in widths.iter().enumerate() {
            if width > max {
                tracing::warn!(
                    "Block {} is {} wide, more than the usable page width {}; placing it alone",
                    i,
                    width,
                    max
                );
            }
            if used + width <= max {
                used += width;
                continue;
            }
            if i > start {
                pages.push(PlannedPage {
                    blocks: start..i,
                    used_width: used,
                });
            }
            start = i;
            used = width;
        }

        if start < widths.len() || pages.is_empty() {
            pages.push(PlannedPage {
                blocks: start..widths.len(),
                used_width: used,
            });
        }
        pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn planner(max_width: f64) -> PageLayoutPlanner {
        PageLayoutPlanner::new(PageLayout {
            column_width: 10.0,
            gap: 5.0,
            max_width,
        })
    }

    fn widths(circuits: &[usize], layout: &PageLayout) -> Vec<f64> {
        circuits.iter().map(|&n| layout.block_width(n)).collect()
    }

    #[test]
    fn test_block_width() {
        let p = planner(100.0);
        assert_eq!(p.layout().block_width(0), 15.0);
        assert_eq!(p.layout().block_width(1), 15.0);
        assert_eq!(p.layout().block_width(4), 45.0);
    }

    #[test]
    fn test_no_blocks_gives_one_empty_page() {
        let pages = planner(100.0).plan_widths(&[]);
        assert_eq!(pages.len(), 1);
        assert!(pages[0].is_empty());
        assert_eq!(pages[0].used_width, 0.0);
    }

    #[test]
    fn test_greedy_packing() {
        let p = planner(100.0);
        // 45 + 35 = 80 fits, + 25 = 105 does not.
        let w = widths(&[4, 3, 2, 1], p.layout());
        let pages = p.plan_widths(&w);
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].blocks, 0..2);
        assert_eq!(pages[0].used_width, 80.0);
        assert_eq!(pages[1].blocks, 2..4);
        assert_eq!(pages[1].used_width, 40.0);
    }

    #[test]
    fn test_exact_fit_stays_on_page() {
        let p = planner(90.0);
        let pages = p.plan_widths(&[45.0, 45.0]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].blocks, 0..2);
    }

    #[test]
    fn test_over_wide_block_is_alone() {
        let p = planner(50.0);
        let pages = p.plan_widths(&[15.0, 125.0, 15.0, 15.0]);
        let ranges: Vec<Range<usize>> = pages.iter().map(|pg| pg.blocks.clone()).collect();
        assert_eq!(ranges, vec![0..1, 1..2, 2..4]);
        assert_eq!(pages[1].used_width, 125.0);
    }

    #[test]
    fn test_over_wide_first_block() {
        let p = planner(50.0);
        let pages = p.plan_widths(&[125.0]);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].blocks, 0..1);
    }

    #[test]
    fn test_pages_concatenate_to_input_and_respect_width() {
        let p = planner(120.0);
        for seed in 0..200usize {
            let circuits: Vec<usize> = (0..(seed % 17))
                .map(|i| (seed * 7 + i * 13) % 15)
                .collect();
            let w = widths(&circuits, p.layout());
            let pages = p.plan_widths(&w);

            let flattened: Vec<usize> = pages.iter().flat_map(|pg| pg.blocks.clone()).collect();
            assert_eq!(flattened, (0..w.len()).collect::<Vec<_>>());

            for page in &pages {
                let total: f64 = w[page.blocks.clone()].iter().sum();
                assert_eq!(total, page.used_width);
                if page.len() > 1 {
                    assert!(page.used_width <= 120.0);
                }
            }
        }
    }
}
