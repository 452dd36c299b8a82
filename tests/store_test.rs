use recipe_fetch::model::Recipe;
use recipe_fetch::store::{RecipeStore, SqliteStore};
use tempfile::tempdir;

fn recipe(id: &str, name: &str) -> Recipe {
    Recipe {
        cuisine: "French".into(),
        name: name.into(),
        photo_url_large: String::new(),
        photo_url_small: String::new(),
        source_url: Some(String::new()),
        id: id.into(),
        youtube_url: None,
    }
}

#[tokio::test]
async fn insert_if_absent_is_idempotent() {
    let store = SqliteStore::open("sqlite::memory:").await.unwrap();
    let batch = vec![
        recipe("1", "Tarte Tatin"),
        recipe("2", "Crème Brûlée"),
        recipe("3", "Clafoutis"),
    ];

    assert_eq!(store.insert_if_absent(&batch).await.unwrap(), 3);
    assert_eq!(store.insert_if_absent(&batch).await.unwrap(), 0);
    assert_eq!(store.count().await.unwrap(), 3);

    // Partial overlap only inserts the new id.
    let overlap = vec![recipe("3", "Clafoutis"), recipe("4", "Madeleines")];
    assert_eq!(store.insert_if_absent(&overlap).await.unwrap(), 1);

    let stored = store.find("1").await.unwrap().unwrap();
    assert_eq!(stored.source_url.as_deref(), Some(""));
    assert_eq!(stored.youtube_url, None);
}

#[tokio::test]
async fn records_survive_reopening_the_database() {
    let td = tempdir().unwrap();
    let url = format!("sqlite://{}/data/recipes.db", td.path().display());

    {
        let store = SqliteStore::open(&url).await.unwrap();
        store
            .insert_if_absent(&[recipe("b", "Bouillabaisse"), recipe("a", "Aligot")])
            .await
            .unwrap();
        store.pool().close().await;
    }

    let store = SqliteStore::open(&url).await.unwrap();
    assert!(!store.is_empty().await.unwrap());
    let names: Vec<_> = store.all().await.unwrap().into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Aligot", "Bouillabaisse"]);

    store.clear_all().await.unwrap();
    assert!(store.is_empty().await.unwrap());
    assert!(store.all().await.unwrap().is_empty());
}
