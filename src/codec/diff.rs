use rayon::prelude::*;

use crate::codec::frames::Normalization;
use crate::codec::patch::{EditOp, EditScript};
use crate::foundation::config::FlipbookConfig;
use crate::foundation::error::{FlipbookError, FlipbookResult};

/// Options for pairwise frame diffing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiffOpts {
    /// Insignificant formatting removed from frames before they are stored and diffed.
    pub normalization: Normalization,
    /// Fan frame pairs out over a dedicated rayon pool.
    pub parallel: bool,
    /// Worker count override. `None` uses rayon defaults.
    pub threads: Option<usize>,
    /// Edit distance explored per bisection before replacing the whole region.
    pub cost_limit: Option<usize>,
    /// Store every N-th frame verbatim in addition to frame 0.
    pub checkpoint_interval: Option<usize>,
}

impl Default for DiffOpts {
    fn default() -> Self {
        Self::from(&FlipbookConfig::default())
    }
}

impl From<&FlipbookConfig> for DiffOpts {
    fn from(cfg: &FlipbookConfig) -> Self {
        Self {
            normalization: Normalization::Base64LineFolding,
            parallel: cfg.parallel_diff,
            threads: cfg.threads,
            cost_limit: cfg.diff_cost_limit,
            checkpoint_interval: cfg.checkpoint_interval,
        }
    }
}

/// Compute the minimal edit script turning `a` into `b`.
///
/// Only non-matching regions are emitted, in ascending base order. Identical inputs yield an
/// empty script.
pub fn diff_frames(a: &str, b: &str) -> EditScript {
    diff_frames_bounded(a, b, None)
}

/// Like [`diff_frames`], but gives up on aligning a region once its edit distance exceeds
/// `cost_limit` and replaces that region wholesale instead.
///
/// The result still reproduces `b` exactly; only minimality is traded for bounded time.
pub fn diff_frames_bounded(a: &str, b: &str, cost_limit: Option<usize>) -> EditScript {
    if a == b {
        return EditScript::default();
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let aligner = Aligner {
        a: &a,
        b: &b,
        cost_limit,
    };
    script_from_blocks(&a, &b, &aligner.matching_blocks())
}

/// Diff every consecutive pair of `frames`, returning `frames.len() - 1` scripts in order.
///
/// Frames are expected to be normalized already. Pairs are independent, so with
/// `opts.parallel` they are diffed on a worker pool and collected back in sequence order.
#[tracing::instrument(
    skip(frames, opts),
    fields(frames = frames.len(), parallel = opts.parallel)
)]
pub fn diff_sequence(frames: &[String], opts: &DiffOpts) -> FlipbookResult<Vec<EditScript>> {
    if frames.len() < 2 {
        return Ok(Vec::new());
    }
    let limit = opts.cost_limit;
    if !opts.parallel {
        return Ok(frames
            .windows(2)
            .map(|pair| diff_frames_bounded(&pair[0], &pair[1], limit))
            .collect());
    }

    let pool = build_thread_pool(opts.threads)?;
    Ok(pool.install(|| {
        frames
            .par_windows(2)
            .map(|pair| diff_frames_bounded(&pair[0], &pair[1], limit))
            .collect()
    }))
}

fn build_thread_pool(threads: Option<usize>) -> FlipbookResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(FlipbookError::validation(
            "diff threading 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| FlipbookError::validation(format!("failed to build rayon thread pool: {e}")))
}

/// `a[a..a + len] == b[b..b + len]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Block {
    a: usize,
    b: usize,
    len: usize,
}

/// Longest-common-subsequence alignment (Myers, middle-snake bisection) over characters.
struct Aligner<'a> {
    a: &'a [char],
    b: &'a [char],
    cost_limit: Option<usize>,
}

impl Aligner<'_> {
    /// Matching blocks in ascending order of both `a` and `b`.
    fn matching_blocks(&self) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut work = vec![(0, self.a.len(), 0, self.b.len())];

        while let Some((mut a_lo, mut a_hi, mut b_lo, mut b_hi)) = work.pop() {
            let prefix = common_prefix(&self.a[a_lo..a_hi], &self.b[b_lo..b_hi]);
            if prefix > 0 {
                blocks.push(Block {
                    a: a_lo,
                    b: b_lo,
                    len: prefix,
                });
                a_lo += prefix;
                b_lo += prefix;
            }
            let suffix = common_suffix(&self.a[a_lo..a_hi], &self.b[b_lo..b_hi]);
            if suffix > 0 {
                a_hi -= suffix;
                b_hi -= suffix;
                blocks.push(Block {
                    a: a_hi,
                    b: b_hi,
                    len: suffix,
                });
            }
            if a_lo == a_hi || b_lo == b_hi {
                continue;
            }
            if let Some((x, y)) = self.bisect(a_lo, a_hi, b_lo, b_hi) {
                work.push((x, a_hi, y, b_hi));
                work.push((a_lo, x, b_lo, y));
            }
        }

        // Sub-ranges are disjoint and monotone in both sequences.
        blocks.sort_unstable_by_key(|blk| blk.a);
        blocks
    }

    /// Find a split point on an optimal edit path through `a[a_lo..a_hi]` x `b[b_lo..b_hi]`.
    ///
    /// Returns `None` when the region shares nothing worth aligning (or the cost limit was hit),
    /// in which case the caller replaces the whole region.
    fn bisect(&self, a_lo: usize, a_hi: usize, b_lo: usize, b_hi: usize) -> Option<(usize, usize)> {
        let a = &self.a[a_lo..a_hi];
        let b = &self.b[b_lo..b_hi];
        let n = a.len() as isize;
        let m = b.len() as isize;

        let max_d = (n + m + 1) / 2;
        let d_limit = match self.cost_limit {
            Some(limit) => max_d.min(limit as isize),
            None => max_d,
        };
        let v_offset = max_d;
        let v_len = (2 * max_d + 2) as usize;
        let mut v1 = vec![-1isize; v_len];
        let mut v2 = vec![-1isize; v_len];
        v1[(v_offset + 1) as usize] = 0;
        v2[(v_offset + 1) as usize] = 0;

        let delta = n - m;
        // Odd delta: the forward path detects the overlap; even: the reverse path does.
        let front = delta % 2 != 0;
        let (mut k1_start, mut k1_end, mut k2_start, mut k2_end) = (0isize, 0isize, 0isize, 0isize);

        for d in 0..d_limit {
            let mut k1 = -d + k1_start;
            while k1 <= d - k1_end {
                let k1_off = (v_offset + k1) as usize;
                let mut x1 = if k1 == -d || (k1 != d && v1[k1_off - 1] < v1[k1_off + 1]) {
                    v1[k1_off + 1]
                } else {
                    v1[k1_off - 1] + 1
                };
                let mut y1 = x1 - k1;
                while x1 >= 0 && y1 >= 0 && x1 < n && y1 < m && a[x1 as usize] == b[y1 as usize] {
                    x1 += 1;
                    y1 += 1;
                }
                v1[k1_off] = x1;
                if x1 > n {
                    k1_end += 2;
                } else if y1 > m {
                    k1_start += 2;
                } else if front {
                    let k2_off = v_offset + delta - k1;
                    if k2_off >= 0 && (k2_off as usize) < v_len && v2[k2_off as usize] != -1 {
                        let x2 = n - v2[k2_off as usize];
                        if x1 >= x2 {
                            return split_point(a_lo, b_lo, x1, y1, n, m);
                        }
                    }
                }
                k1 += 2;
            }

            let mut k2 = -d + k2_start;
            while k2 <= d - k2_end {
                let k2_off = (v_offset + k2) as usize;
                let mut x2 = if k2 == -d || (k2 != d && v2[k2_off - 1] < v2[k2_off + 1]) {
                    v2[k2_off + 1]
                } else {
                    v2[k2_off - 1] + 1
                };
                let mut y2 = x2 - k2;
                while x2 >= 0
                    && y2 >= 0
                    && x2 < n
                    && y2 < m
                    && a[(n - x2 - 1) as usize] == b[(m - y2 - 1) as usize]
                {
                    x2 += 1;
                    y2 += 1;
                }
                v2[k2_off] = x2;
                if x2 > n {
                    k2_end += 2;
                } else if y2 > m {
                    k2_start += 2;
                } else if !front {
                    let k1_off = v_offset + delta - k2;
                    if k1_off >= 0 && (k1_off as usize) < v_len && v1[k1_off as usize] != -1 {
                        let x1 = v1[k1_off as usize];
                        let y1 = v_offset + x1 - k1_off;
                        if x1 >= n - x2 {
                            return split_point(a_lo, b_lo, x1, y1, n, m);
                        }
                    }
                }
                k2 += 2;
            }
        }
        None
    }
}

fn split_point(
    a_lo: usize,
    b_lo: usize,
    x: isize,
    y: isize,
    n: isize,
    m: isize,
) -> Option<(usize, usize)> {
    let in_range = (0..=n).contains(&x) && (0..=m).contains(&y);
    let trivial = (x == 0 && y == 0) || (x == n && y == m);
    if !in_range || trivial {
        return None;
    }
    Some((a_lo + x as usize, b_lo + y as usize))
}

fn common_prefix(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[char], b: &[char]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Emit one operation per gap between consecutive matching blocks.
fn script_from_blocks(a: &[char], b: &[char], blocks: &[Block]) -> EditScript {
    let sentinel = Block {
        a: a.len(),
        b: b.len(),
        len: 0,
    };
    let mut ops = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    for blk in blocks.iter().chain(std::iter::once(&sentinel)) {
        if i < blk.a || j < blk.b {
            let data: String = b[j..blk.b].iter().collect();
            ops.push(EditOp {
                low: i,
                high: blk.a,
                data,
            });
        }
        i = blk.a + blk.len;
        j = blk.b + blk.len;
    }
    EditScript::new(ops)
}

#[cfg(test)]
#[path = "../../tests/unit/codec/diff.rs"]
mod tests;
