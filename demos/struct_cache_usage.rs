//! Walks through the main `StructCache` operations: put, get, renewal,
//! count, remove, flush, and find-by-substring.

use std::time::Duration;

use go_cache_rs::flushable::Flushable;
use go_cache_rs::key::Key;
use go_cache_rs::struct_cache::StructCache;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cache: StructCache<String> = StructCache::with_defaults(8000);
    let ttl = Duration::from_secs(5 * 60);

    let key = Key::new("set", "1");
    cache
        .put(
            "The essential is invisible to the eyes, \
             we can not truly see but with the eyes of the heart."
                .to_string(),
            &key,
            ttl,
        )
        .unwrap();
    println!("{}", cache.get(&key).unwrap());

    // Renewing an existing key overwrites its data without changing count.
    let renew_key = Key::new("set1", "1");
    cache.put("data".to_string(), &renew_key, ttl).unwrap();
    cache
        .put(
            "Your most unhappy customers are your greatest source of learning.".to_string(),
            &renew_key,
            ttl,
        )
        .unwrap();
    println!("{}", cache.get(&renew_key).unwrap());

    // Count sums entries across every set they've landed in.
    cache.put("data".to_string(), &Key::new("set1", "2"), ttl).unwrap();
    cache.put("data".to_string(), &Key::new("set2", "1"), ttl).unwrap();
    println!("{}", cache.count());

    // Remove drops a single entry.
    cache.remove(&renew_key);
    println!("{}", cache.count());

    // Find scans every set for keys containing a substring, case-insensitively.
    cache.put("data".to_string(), &Key::new("set1", "mask"), ttl).unwrap();
    println!("{:?}", cache.find("as", 1));

    // SetLimit caps how many entries a newly registered set may hold.
    let limited: StructCache<String> = StructCache::with_defaults(1000);
    limited.set_limit(1);
    limited.put("data".to_string(), &Key::new("set1", "1"), ttl).unwrap();
    limited.put("data".to_string(), &Key::new("set1", "2"), ttl).unwrap();
    println!("{}", limited.count());

    // Flush drops everything and reports how many entries were removed.
    println!("{}", cache.flush());
}
