//! Tests for the color index: alignment, batch queries and persistence

#[cfg(test)]
mod tests {
    use cardmosaic::MosaicError;
    use cardmosaic::catalog::item::ReferenceItem;
    use cardmosaic::color::extraction::ColorExtractor;
    use cardmosaic::color::point::{ColorPoint, NEUTRAL_COLOR};
    use cardmosaic::spatial::index::ColorIndex;
    use cardmosaic::spatial::kdtree::KdTree;
    use ndarray::{Array2, array};
    use serde::Serialize;
    use std::fs::File;
    use std::io::BufWriter;
    use std::path::Path;

    // Field-for-field mirror of the persisted layout, so blobs can be corrupted by hand
    #[derive(Serialize)]
    enum NodeBlob {
        Leaf {
            start: usize,
            end: usize,
        },
        Split {
            axis: usize,
            value: f32,
            left: usize,
            right: usize,
        },
    }

    #[derive(Serialize)]
    struct TreeBlob {
        points: Vec<[f32; 3]>,
        order: Vec<usize>,
        nodes: Vec<NodeBlob>,
        leaf_size: usize,
    }

    #[derive(Serialize)]
    struct IndexBlob {
        tree: TreeBlob,
        items: Vec<ReferenceItem>,
        colors: Array2<f32>,
    }

    fn dark_light_blob(nodes: Vec<NodeBlob>, colors: Array2<f32>) -> IndexBlob {
        IndexBlob {
            tree: TreeBlob {
                points: vec![[0.0, 0.0, 0.0], [100.0, 0.0, 0.0]],
                order: vec![0, 1],
                nodes,
                leaf_size: 1,
            },
            items: vec![
                ReferenceItem::new("dark", "dark.png").with_color(ColorPoint::new(0.0, 0.0, 0.0)),
                ReferenceItem::new("light", "light.png")
                    .with_color(ColorPoint::new(100.0, 0.0, 0.0)),
            ],
            colors,
        }
    }

    fn matching_colors() -> Array2<f32> {
        array![[0.0, 0.0, 0.0], [100.0, 0.0, 0.0]]
    }

    fn split_nodes() -> Vec<NodeBlob> {
        vec![
            NodeBlob::Split {
                axis: 0,
                value: 100.0,
                left: 1,
                right: 2,
            },
            NodeBlob::Leaf { start: 0, end: 1 },
            NodeBlob::Leaf { start: 1, end: 2 },
        ]
    }

    fn write_blob(path: &Path, blob: &IndexBlob) -> cardmosaic::Result<()> {
        let file = File::create(path)?;
        bincode::serialize_into(BufWriter::new(file), blob).map_err(|source| {
            MosaicError::Persistence {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    fn palette() -> Vec<ReferenceItem> {
        [
            ("black", ColorPoint::new(0.0, 0.0, 0.0)),
            ("white", ColorPoint::new(100.0, 0.0, 0.0)),
            ("red", ColorPoint::new(53.24, 80.09, 67.2)),
            ("blue", ColorPoint::new(32.3, 79.19, -107.86)),
        ]
        .into_iter()
        .map(|(id, color)| ReferenceItem::new(id, format!("cards/{id}.png")).with_color(color))
        .collect()
    }

    fn palette_index() -> cardmosaic::Result<ColorIndex> {
        ColorIndex::build(palette(), &ColorExtractor::default(), 2)
    }

    // Tests tree positions, matrix rows and items stay aligned
    // Fails if any of the three parts is reordered during the build
    #[test]
    fn test_parts_aligned() -> cardmosaic::Result<()> {
        let index = palette_index()?;
        assert_eq!(index.len(), 4);
        assert_eq!(index.colors().dim(), (4, 3));

        for (row, item) in index.items().iter().enumerate() {
            let color = item.cached_color();
            assert!(color.is_some());
            if let Some(color) = color {
                let stored: Vec<f32> = (0..3)
                    .filter_map(|col| index.colors().get((row, col)).copied())
                    .collect();
                assert_eq!(stored, color.to_array().to_vec());
                assert_eq!(index.tree().point(row), Some(color));
            }
        }
        Ok(())
    }

    // Tests batch matching returns one item per query, in query order
    // Fails if parallel queries are collected out of order
    #[test]
    fn test_match_items_in_query_order() -> cardmosaic::Result<()> {
        let index = palette_index()?;
        let queries = vec![
            ColorPoint::new(95.0, 1.0, -1.0),
            ColorPoint::new(30.0, 70.0, -100.0),
            ColorPoint::new(3.0, 0.0, 0.0),
            ColorPoint::new(50.0, 75.0, 60.0),
            ColorPoint::new(99.0, 0.0, 0.0),
        ];

        let ids: Vec<&str> = index
            .match_items(&queries)?
            .into_iter()
            .map(ReferenceItem::id)
            .collect();
        assert_eq!(ids, vec!["white", "blue", "black", "red", "white"]);

        let positions: Vec<usize> = index
            .nearest_batch(&queries)?
            .into_iter()
            .map(|n| n.index)
            .collect();
        assert_eq!(positions, vec![1, 3, 0, 2, 1]);
        Ok(())
    }

    // Tests k-nearest batch queries keep per-query ordering
    // Fails if neighbours are not sorted by distance
    #[test]
    fn test_query_k() -> cardmosaic::Result<()> {
        let index = palette_index()?;
        let results = index.query(&[ColorPoint::new(10.0, 0.0, 0.0)], 2);

        assert_eq!(results.len(), 1);
        let first: Vec<usize> = results
            .first()
            .map(|neighbors| neighbors.iter().map(|n| n.index).collect())
            .unwrap_or_default();
        assert_eq!(first, vec![0, 1]);
        Ok(())
    }

    // Tests missing colors are measured during the build
    // Fails if uncolored items are indexed without a color
    #[test]
    fn test_build_measures_missing_colors() -> cardmosaic::Result<()> {
        let mut items = palette();
        items.push(ReferenceItem::new("missing", "nowhere/missing.png"));

        let index = ColorIndex::build(items, &ColorExtractor::default(), 10)?;
        let last = index.item(4);
        assert!(last.is_some_and(|item| item.cached_color() == Some(NEUTRAL_COLOR)));
        Ok(())
    }

    // Tests a saved index reloads equal and answers identically
    // Fails if any part is dropped from the persisted blob
    #[test]
    fn test_save_load_round_trip() -> cardmosaic::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("index.bin");
        let index = palette_index()?;

        index.save(&path)?;
        let reloaded = ColorIndex::load(&path)?;
        assert_eq!(reloaded, index);

        let queries = [ColorPoint::new(60.0, 60.0, 60.0), NEUTRAL_COLOR];
        let ids = |index: &ColorIndex| -> cardmosaic::Result<Vec<String>> {
            Ok(index
                .match_items(&queries)?
                .into_iter()
                .map(|item| item.id().to_owned())
                .collect())
        };
        assert_eq!(ids(&index)?, ids(&reloaded)?);
        Ok(())
    }

    // Tests corrupt and missing blobs produce typed errors
    // Fails if a garbage file decodes into an index
    #[test]
    fn test_load_rejects_bad_blobs() -> cardmosaic::Result<()> {
        let dir = tempfile::tempdir()?;
        let garbage = dir.path().join("garbage.bin");
        std::fs::write(&garbage, [0xff_u8; 7])?;

        assert!(matches!(
            ColorIndex::load(&garbage),
            Err(MosaicError::Persistence { .. })
        ));
        assert!(matches!(
            ColorIndex::load(dir.path().join("absent.bin")),
            Err(MosaicError::FileSystem { .. })
        ));
        Ok(())
    }

    // Tests misaligned parts are refused
    // Fails if an index with fewer items or foreign colors is accepted
    #[test]
    fn test_from_parts_rejects_mismatch() -> cardmosaic::Result<()> {
        let items = palette();
        let points: Vec<ColorPoint> = items
            .iter()
            .filter_map(ReferenceItem::cached_color)
            .collect();
        let tree = KdTree::build(&points, 2)?;

        let short_items = items.iter().take(3).cloned().collect();
        assert!(matches!(
            ColorIndex::from_parts(tree.clone(), short_items, Array2::zeros((4, 3))),
            Err(MosaicError::IndexMismatch { .. })
        ));
        assert!(matches!(
            ColorIndex::from_parts(tree.clone(), items.clone(), Array2::zeros((4, 2))),
            Err(MosaicError::IndexMismatch { .. })
        ));
        assert!(matches!(
            ColorIndex::from_parts(tree.clone(), items.clone(), Array2::zeros((4, 3))),
            Err(MosaicError::IndexMismatch { .. })
        ));

        let colors = Array2::from_shape_fn((4, 3), |(row, col)| {
            points
                .get(row)
                .and_then(|point| point.to_array().get(col).copied())
                .unwrap_or(f32::NAN)
        });
        assert!(ColorIndex::from_parts(tree, items, colors).is_ok());
        Ok(())
    }

    // Tests an empty catalog cannot be indexed
    // Fails if an empty index is constructed
    #[test]
    fn test_empty_catalog_rejected() {
        assert!(matches!(
            ColorIndex::build(Vec::new(), &ColorExtractor::default(), 10),
            Err(MosaicError::EmptyIndex)
        ));
    }

    // Tests a hand-written blob with a well-formed tree loads and answers correctly
    // Fails if the persisted layout drifts from the mirror used by the corruption tests
    #[test]
    fn test_load_accepts_well_formed_blob() -> cardmosaic::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("index.bin");
        write_blob(&path, &dark_light_blob(split_nodes(), matching_colors()))?;

        let index = ColorIndex::load(&path)?;
        let matched = index.match_items(&[ColorPoint::new(100.0, 0.0, 0.0)])?;
        assert_eq!(matched.first().map(|item| item.id()), Some("light"));
        Ok(())
    }

    // Tests a leaf covering only part of the points is refused on load
    // Fails if uncovered points can silently never be matched
    #[test]
    fn test_load_rejects_short_leaf() -> cardmosaic::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("index.bin");
        let nodes = vec![NodeBlob::Leaf { start: 0, end: 1 }];
        write_blob(&path, &dark_light_blob(nodes, matching_colors()))?;

        assert!(matches!(
            ColorIndex::load(&path),
            Err(MosaicError::IndexMismatch { .. })
        ));
        Ok(())
    }

    // Tests a split pointing back at itself is refused on load
    // Fails if a cyclic node graph reaches the recursive search
    #[test]
    fn test_load_rejects_cyclic_tree() -> cardmosaic::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("index.bin");
        let nodes = vec![
            NodeBlob::Split {
                axis: 0,
                value: 50.0,
                left: 0,
                right: 1,
            },
            NodeBlob::Leaf { start: 0, end: 2 },
        ];
        write_blob(&path, &dark_light_blob(nodes, matching_colors()))?;

        assert!(matches!(
            ColorIndex::load(&path),
            Err(MosaicError::IndexMismatch { .. })
        ));
        Ok(())
    }

    // Tests overlapping leaves and unreachable nodes are refused on load
    // Fails if leaves are not required to tile every position exactly once
    #[test]
    fn test_load_rejects_overlap_and_orphans() -> cardmosaic::Result<()> {
        let dir = tempfile::tempdir()?;
        let overlapping = dir.path().join("overlap.bin");
        let nodes = vec![
            NodeBlob::Split {
                axis: 0,
                value: 100.0,
                left: 1,
                right: 2,
            },
            NodeBlob::Leaf { start: 0, end: 2 },
            NodeBlob::Leaf { start: 1, end: 2 },
        ];
        write_blob(&overlapping, &dark_light_blob(nodes, matching_colors()))?;

        let orphaned = dir.path().join("orphan.bin");
        let nodes = vec![
            NodeBlob::Leaf { start: 0, end: 2 },
            NodeBlob::Leaf { start: 0, end: 2 },
        ];
        write_blob(&orphaned, &dark_light_blob(nodes, matching_colors()))?;

        for path in [overlapping, orphaned] {
            assert!(matches!(
                ColorIndex::load(&path),
                Err(MosaicError::IndexMismatch { .. })
            ));
        }
        Ok(())
    }

    // Tests a color matrix disagreeing with the tree's points is refused on load
    // Fails if color rows are only checked for their count
    #[test]
    fn test_load_rejects_color_rows_mismatch() -> cardmosaic::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("index.bin");
        let swapped = array![[100.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        write_blob(&path, &dark_light_blob(split_nodes(), swapped))?;

        assert!(matches!(
            ColorIndex::load(&path),
            Err(MosaicError::IndexMismatch { .. })
        ));
        Ok(())
    }
}
