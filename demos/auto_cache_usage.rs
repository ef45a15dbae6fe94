//! Walks through `AutoCache::get`, showing lazy bootstrap and the
//! `KeyNotFound` error's preserved wording after a `remove`.

use std::sync::Arc;
use std::time::Duration;

use go_cache_rs::auto_cache::{AutoCache, StorageAutoCache};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cache = StorageAutoCache::with_defaults();

    let key = "unique-key";
    cache
        .put(key, Duration::from_secs(100), Arc::new(|| Ok::<_, anyhow::Error>(5)))
        .unwrap();

    println!("{}", cache.get(key).unwrap());

    cache.remove(key);

    match cache.get(key) {
        Ok(_) => unreachable!("key was just removed"),
        Err(err) => println!("{err}"),
    }
}
