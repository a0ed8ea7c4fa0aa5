//! Tests for grid derivation, tile enumeration and canvas resampling

#[cfg(test)]
mod tests {
    use cardmosaic::MosaicError;
    use cardmosaic::color::extraction::Region;
    use cardmosaic::mosaic::grid::MosaicGrid;
    use image::{Rgb, RgbImage};

    // Tests the default card tile on an 800x600 photo
    // Fails if cell counts truncate instead of rounding
    #[test]
    fn test_default_tile_on_landscape_photo() -> cardmosaic::Result<()> {
        let grid = MosaicGrid::compute((800, 600), (177, 250), 1.0)?;
        assert_eq!(grid.cols(), 5);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.tile_count(), 10);
        assert_eq!(grid.canvas_size(), (885, 500));
        Ok(())
    }

    // Tests scale multiplies the cell count on both axes
    // Fails if scale is applied to the tile size instead of the count
    #[test]
    fn test_scale_increases_density() -> cardmosaic::Result<()> {
        let grid = MosaicGrid::compute((800, 600), (177, 250), 2.0)?;
        assert_eq!((grid.cols(), grid.rows()), (9, 5));
        assert_eq!(grid.canvas_size(), (9 * 177, 5 * 250));
        Ok(())
    }

    // Tests tiny photos still get one tile per axis
    // Fails if the lower bound of one cell is dropped
    #[test]
    fn test_minimum_one_cell() -> cardmosaic::Result<()> {
        let grid = MosaicGrid::compute((10, 10), (177, 250), 1.0)?;
        assert_eq!((grid.cols(), grid.rows()), (1, 1));
        assert_eq!(grid.canvas_size(), (177, 250));

        let sparse = MosaicGrid::compute((800, 600), (177, 250), 0.01)?;
        assert_eq!(sparse.tile_count(), 1);
        Ok(())
    }

    // Tests flat tile indices map to row-major coordinates
    // Fails if column and row are swapped
    #[test]
    fn test_row_major_coordinates() -> cardmosaic::Result<()> {
        let grid = MosaicGrid::new(5, 2, 177, 250)?;

        assert_eq!(grid.grid_coordinate(0), Some((0, 0)));
        assert_eq!(grid.grid_coordinate(4), Some((4, 0)));
        assert_eq!(grid.grid_coordinate(7), Some((2, 1)));
        assert_eq!(grid.grid_coordinate(10), None);
        assert_eq!(grid.tile_origin(7), Some((354, 250)));

        let tile = grid.tile(7);
        assert!(tile.is_some_and(|t| t.column == 2 && t.row == 1));
        assert!(tile.is_some_and(|t| t.region == Region::new(354, 250, 177, 250)));
        Ok(())
    }

    // Tests tile enumeration covers the canvas exactly once in order
    // Fails if tiles overlap, leave gaps or enumerate column-major
    #[test]
    fn test_tiles_partition_canvas() -> cardmosaic::Result<()> {
        let grid = MosaicGrid::new(3, 4, 7, 5)?;
        let tiles: Vec<_> = grid.tiles().collect();
        assert_eq!(tiles.len(), 12);

        let (width, height) = grid.canvas_size();
        let mut covered = vec![0_u8; (width * height) as usize];
        for (expected_index, tile) in tiles.iter().enumerate() {
            assert_eq!(tile.index, expected_index);
            let region = tile.region;
            for y in region.y..region.y + region.height {
                for x in region.x..region.x + region.width {
                    if let Some(cell) = covered.get_mut((y * width + x) as usize) {
                        *cell += 1;
                    }
                }
            }
        }
        assert!(covered.iter().all(|&count| count == 1));

        let columns: Vec<u32> = tiles.iter().take(4).map(|t| t.column).collect();
        assert_eq!(columns, vec![0, 1, 2, 0]);
        Ok(())
    }

    // Tests resampling produces exactly the canvas size
    // Fails if the photo is cropped or padded instead of resampled
    #[test]
    fn test_resize_to_canvas() -> cardmosaic::Result<()> {
        let grid = MosaicGrid::compute((800, 600), (177, 250), 1.0)?;
        let photo = RgbImage::from_pixel(800, 600, Rgb([120, 80, 40]));

        let resized = grid.resize_to_canvas(&photo);
        assert_eq!(resized.dimensions(), (885, 500));

        let exact = RgbImage::from_pixel(885, 500, Rgb([1, 2, 3]));
        assert_eq!(grid.resize_to_canvas(&exact), exact);
        Ok(())
    }

    // Tests degenerate inputs are rejected with the offending parameter
    // Fails if a zero or non-finite value reaches the division
    #[test]
    fn test_invalid_inputs_rejected() {
        let cases = [
            MosaicGrid::compute((0, 600), (177, 250), 1.0),
            MosaicGrid::compute((800, 600), (0, 250), 1.0),
            MosaicGrid::compute((800, 600), (177, 250), 0.0),
            MosaicGrid::compute((800, 600), (177, 250), -1.0),
            MosaicGrid::compute((800, 600), (177, 250), f64::NAN),
            MosaicGrid::compute((800, 600), (177, 250), f64::INFINITY),
            MosaicGrid::new(0, 1, 1, 1),
            MosaicGrid::new(u32::MAX, 1, 2, 1),
        ];
        for case in cases {
            assert!(matches!(case, Err(MosaicError::InvalidParameter { .. })));
        }
    }
}
