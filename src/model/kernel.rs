//! Convolution kernel sizing

use crate::error::{Error, Result};

/// Kernel size that tiles `image_dims` with `blocks_y` x `blocks_x` blocks.
///
/// Each side is the ceiling of the image side over the block count, so the blocks cover
/// the whole image even when it does not divide evenly.
pub fn calc_kernel_size(
    image_dims: [usize; 2],
    blocks_y: usize,
    blocks_x: usize,
) -> Result<[usize; 2]> {
    if blocks_y == 0 || blocks_x == 0 {
        return Err(Error::InvalidConfig(format!(
            "block counts must be positive, got {} x {}",
            blocks_y, blocks_x
        )));
    }

    Ok([
        image_dims[0].div_ceil(blocks_y),
        image_dims[1].div_ceil(blocks_x),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_split() {
        assert_eq!(calc_kernel_size([128, 128], 8, 8).unwrap(), [16, 16]);
    }

    #[test]
    fn test_uneven_split_rounds_up() {
        assert_eq!(calc_kernel_size([100, 50], 8, 3).unwrap(), [13, 17]);
    }

    #[test]
    fn test_zero_blocks_rejected() {
        for (blocks_y, blocks_x) in [(0, 4), (4, 0), (0, 0)] {
            let err = calc_kernel_size([128, 128], blocks_y, blocks_x).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)));
        }
    }
}
