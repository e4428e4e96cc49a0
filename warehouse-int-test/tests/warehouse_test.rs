use warehouse::errors::ErrorKind;
use warehouse::warehouse::{StoreOutcome, Warehouse};
use warehouse_int_test::test_util::{create_test_context, run_test, Product};

#[ctor::ctor]
fn init() {
    colog::init();
}

#[tokio::test]
async fn test_get_absent_document() {
    run_test(10, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        assert_eq!(products.get("nothing-here").await?, None);
        assert!(!products.exists("nothing-here").await?);
        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_store_then_get() {
    run_test(10, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        let hammer = Product::new("hammer", "tools", 12.5).with_tags(&["steel", "claw"]);

        let outcome = products.store(&hammer, "p-1").await?;
        assert_eq!(outcome, StoreOutcome::Created("p-1".into()));
        assert_eq!(products.get("p-1").await?, Some(hammer));
        assert!(products.exists("p-1").await?);
        assert_eq!(ctx.document_count("products"), Some(1));
        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_store_never_overwrites() {
    run_test(10, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        let first = Product::new("hammer", "tools", 12.5);
        let second = Product::new("saw", "tools", 30.0);

        assert!(products.store(&first, "p-1").await?.is_created());
        let outcome = products.store(&second, "p-1").await?;
        assert_eq!(outcome, StoreOutcome::Existing("p-1".into()));
        assert_eq!(products.get("p-1").await?, Some(first));
        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_update_replaces_document() {
    run_test(10, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        products
            .store(&Product::new("hammer", "tools", 12.5), "p-1")
            .await?;

        let cheaper = Product::new("hammer", "tools", 9.99);
        products.update(&cheaper, "p-1").await?;
        assert_eq!(products.get("p-1").await?, Some(cheaper));
        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_update_missing_document() {
    run_test(10, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        let err = products
            .update(&Product::new("ghost", "tools", 1.0), "p-404")
            .await
            .err()
            .unwrap();
        assert_eq!(err.kind(), &ErrorKind::NotFound);
        assert_eq!(products.get("p-404").await?, None);
        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_delete_then_get() {
    run_test(10, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        products
            .store(&Product::new("rake", "garden", 15.0), "p-7")
            .await?;

        products.delete("p-7").await?;
        assert_eq!(products.get("p-7").await?, None);

        let err = products.delete("p-7").await.err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::NotFound);
        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_invalid_ids_are_rejected() {
    run_test(10, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        let rake = Product::new("rake", "garden", 15.0);
        for id in ["", "a/b", "what?", "x#y"] {
            let err = products.store(&rake, id).await.err().unwrap();
            assert_eq!(err.kind(), &ErrorKind::InvalidId, "id {:?}", id);
        }
        assert_eq!(ctx.document_count("products"), Some(0));
        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_clones_share_coordinates() {
    run_test(10, |ctx| async move {
        let products: Warehouse<Product> = ctx.warehouse("products").await?;
        let clone = products.clone();
        clone
            .store(&Product::new("pot", "kitchen", 20.0), "p-3")
            .await?;
        assert!(products.get("p-3").await?.is_some());

        clone.clean_collection().await?;
        assert!(!products.is_initialized());
        Ok(())
    })
    .await;
}

#[tokio::test]
async fn test_operations_before_initialize() {
    let ctx = create_test_context(10);
    let products: Warehouse<Product> = Warehouse::builder()
        .store(ctx.document_store())
        .build()
        .unwrap_or_else(|e| panic!("{}", e));

    assert_eq!(
        products.get("p-1").await.err().unwrap().kind(),
        &ErrorKind::NotInitialized
    );
    assert_eq!(
        products.get_all().await.err().unwrap().kind(),
        &ErrorKind::NotInitialized
    );
    assert_eq!(
        products
            .store(&Product::new("pot", "kitchen", 20.0), "p-1")
            .await
            .err()
            .unwrap()
            .kind(),
        &ErrorKind::NotInitialized
    );
    assert_eq!(ctx.document_count("products"), None);
}
