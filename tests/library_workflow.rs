//! End-to-end workflows through the application facade.

use chunkdb::{
    ChunkDb, ChunkDbError, ChunkFilter, ChunkInput, ChunkMetadataInput, ChunkUpdate, CustomFields,
    IndexKind,
};

fn chunk_input(text: &str, embedding: Vec<f32>, source: &str) -> ChunkInput {
    ChunkInput {
        text: text.to_string(),
        embedding,
        metadata: ChunkMetadataInput {
            source: Some(source.to_string()),
            page_number: None,
            custom_fields: CustomFields::new(),
        },
    }
}

#[test]
fn test_index_then_search_returns_exact_match() {
    for kind in [IndexKind::BruteForce, IndexKind::KdTree] {
        let db = ChunkDb::new(kind);

        let doc = db
            .create_document(
                "greetings",
                None,
                CustomFields::new(),
                vec![chunk_input("hello", vec![1.0, 0.0], "greetings.txt")],
            )
            .unwrap();
        let lib = db
            .create_library("demo", "demo library", CustomFields::new(), vec![doc.id])
            .unwrap();

        db.index_library(&lib.id).unwrap();

        let results = db
            .find_similar_chunks(&lib.id, vec![1.0, 0.0], 1, None, 0.0)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0.chunk_id, doc.chunks[0].id);
        assert!((results[0].1 - 1.0).abs() < 1e-6, "similarity ~ 1.0");
    }
}

#[test]
fn test_search_without_index_is_a_distinct_failure() {
    let db = ChunkDb::new(IndexKind::BruteForce);
    let lib = db
        .create_library("empty", "", CustomFields::new(), vec![])
        .unwrap();

    let result = db.find_similar_chunks(&lib.id, vec![1.0, 0.0], 1, None, 0.0);
    assert!(matches!(result, Err(ChunkDbError::IndexNotBuilt)));
}

#[test]
fn test_membership_change_invalidates_until_reindexed() {
    let db = ChunkDb::new(IndexKind::KdTree);
    let doc_a = db
        .create_document(
            "a",
            None,
            CustomFields::new(),
            vec![chunk_input("alpha", vec![1.0, 0.0], "a.txt")],
        )
        .unwrap();
    let doc_b = db
        .create_document(
            "b",
            None,
            CustomFields::new(),
            vec![chunk_input("beta", vec![0.0, 1.0], "b.txt")],
        )
        .unwrap();
    let lib = db
        .create_library("lib", "", CustomFields::new(), vec![doc_a.id])
        .unwrap();

    db.index_library(&lib.id).unwrap();
    assert!(db.get_library(&lib.id).unwrap().is_indexed());

    db.add_document_to_library(&lib.id, doc_b.id).unwrap();
    let stale = db.get_library(&lib.id).unwrap();
    assert!(!stale.is_indexed());
    assert!(stale.get_indexed_chunks().is_empty());
    assert!(matches!(
        db.find_similar_chunks(&lib.id, vec![1.0, 0.0], 1, None, 0.0),
        Err(ChunkDbError::IndexNotBuilt)
    ));

    db.index_library(&lib.id).unwrap();
    let fresh = db.get_library(&lib.id).unwrap();
    assert!(fresh.is_indexed());
    assert_eq!(fresh.get_indexed_chunks().len(), 2);

    db.remove_document_from_library(&lib.id, &doc_b.id).unwrap();
    assert!(!db.get_library(&lib.id).unwrap().is_indexed());
}

#[test]
fn test_filtered_search_never_pads() {
    let db = ChunkDb::new(IndexKind::BruteForce);
    let doc = db
        .create_document(
            "mixed",
            None,
            CustomFields::new(),
            vec![
                chunk_input("from x", vec![1.0, 0.0], "x"),
                chunk_input("from y", vec![0.9, 0.1], "y"),
                chunk_input("also y", vec![0.8, 0.2], "y"),
            ],
        )
        .unwrap();
    let lib = db
        .create_library("lib", "", CustomFields::new(), vec![doc.id])
        .unwrap();
    db.index_library(&lib.id).unwrap();

    let filter = ChunkFilter {
        source: Some("x".to_string()),
        ..Default::default()
    };
    let results = db
        .find_similar_chunks(&lib.id, vec![1.0, 0.0], 3, Some(&filter), 0.0)
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0.metadata.source, "x");
}

#[test]
fn test_chunk_edit_then_reindex_reflects_new_text() {
    let db = ChunkDb::new(IndexKind::BruteForce);
    let doc = db
        .create_document(
            "doc",
            None,
            CustomFields::new(),
            vec![chunk_input("old text", vec![1.0, 0.0], "s")],
        )
        .unwrap();
    let chunk_id = doc.chunks[0].id;
    let lib = db
        .create_library("lib", "", CustomFields::new(), vec![doc.id])
        .unwrap();
    db.index_library(&lib.id).unwrap();

    // Editing a chunk does not touch the already built index...
    db.update_chunk(
        &doc.id,
        &chunk_id,
        ChunkUpdate {
            text: Some("new text".to_string()),
            ..Default::default()
        },
    )
    .unwrap();
    let indexed = db.get_library(&lib.id).unwrap().get_indexed_chunks();
    assert_eq!(indexed[0].text, "old text");

    // ...until an explicit re-index rebuilds it from the current chunks.
    db.index_library(&lib.id).unwrap();
    let indexed = db.get_library(&lib.id).unwrap().get_indexed_chunks();
    assert_eq!(indexed[0].text, "new text");
}

#[test]
fn test_indexing_library_of_empty_documents_fails() {
    let db = ChunkDb::new(IndexKind::BruteForce);
    let doc = db
        .create_document("empty", None, CustomFields::new(), vec![])
        .unwrap();
    let lib = db
        .create_library("lib", "", CustomFields::new(), vec![doc.id])
        .unwrap();

    let result = db.index_library(&lib.id);
    assert!(matches!(result, Err(ChunkDbError::InvalidEntity { .. })));
}

#[test]
fn test_deleting_document_breaks_future_indexing() {
    let db = ChunkDb::new(IndexKind::BruteForce);
    let doc = db
        .create_document(
            "doc",
            None,
            CustomFields::new(),
            vec![chunk_input("text", vec![1.0], "s")],
        )
        .unwrap();
    let lib = db
        .create_library("lib", "", CustomFields::new(), vec![doc.id])
        .unwrap();
    db.index_library(&lib.id).unwrap();

    db.delete_document(&doc.id).unwrap();

    // The reference is now dangling; re-indexing must fail fast.
    let result = db.index_library(&lib.id);
    assert!(matches!(result, Err(ChunkDbError::NotFound { .. })));
}

#[test]
fn test_duplicate_library_reference_rejected() {
    let db = ChunkDb::new(IndexKind::BruteForce);
    let doc = db
        .create_document("doc", None, CustomFields::new(), vec![])
        .unwrap();
    let lib = db
        .create_library("lib", "", CustomFields::new(), vec![doc.id])
        .unwrap();

    let result = db.add_document_to_library(&lib.id, doc.id);
    assert!(matches!(result, Err(ChunkDbError::InvalidEntity { .. })));
}
