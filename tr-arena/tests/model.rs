use rand::{
    rngs::StdRng,
    seq::{IndexedRandom, IteratorRandom},
    Rng, SeedableRng,
};
use tr_arena::{Handle, SlotMap, SparseMap};

#[test]
fn slot_map_matches_model() {
    let mut map = SlotMap::<u64>::new();
    let mut model = rustc_hash::FxHashMap::default();
    let mut dead_keys = Vec::new();

    let seed = rand::random();
    let mut rng = StdRng::from_seed(seed);

    scopeguard::defer_on_unwind! {
        println!("SEED: {seed:?}");
    }

    for i in 0..1024 * 64 {
        scopeguard::defer_on_unwind! {
            println!("failed on iteration {i}")
        }
        match rng.random_range(0..=4) {
            0 => {
                let x = rng.random();
                let key = map.insert(x);
                assert!(!model.contains_key(&key));
                model.insert(key, x);
            }
            1 => {
                let Some((&key, &val)) = model.iter().choose(&mut rng) else {
                    continue;
                };

                assert_eq!(map[key], val);
            }
            2 => {
                let Some((&key, val)) = model.iter_mut().choose(&mut rng) else {
                    continue;
                };

                assert_eq!(map[key], *val);
                *val = rng.random();
                map[key] = *val;
            }
            3 => {
                let Some((&key, &val)) = model.iter().choose(&mut rng) else {
                    continue;
                };
                model.remove(&key);

                assert_eq!(map.remove(key), val);
                dead_keys.push(key);
            }
            4 => {
                let Some(&key) = dead_keys.as_slice().choose(&mut rng) else {
                    continue;
                };

                assert!(!map.contains(key));
                assert!(map.get(key).is_none());
                assert!(map.get_mut(key).is_none());
                assert!(map.try_remove(key).is_none());
            }
            _ => unreachable!(),
        }

        assert_eq!(map.len(), model.len());
    }

    for key in dead_keys {
        assert!(map.get(key).is_none());
        assert!(map.try_remove(key).is_none());
    }

    for (key, val) in &model {
        assert_eq!(map.get(*key), Some(val));
    }
}

// the sequence that the original slot map stress test ran: fill, drain half,
// refill, drain everything, then clear and do it again
#[test]
fn fill_and_drain() {
    const MAX_EL: usize = 5000;

    let mut map = SlotMap::<u64>::new();
    let mut model = rustc_hash::FxHashMap::default();
    let seed = rand::random();
    let mut rng = StdRng::from_seed(seed);

    scopeguard::defer_on_unwind! {
        println!("SEED: {seed:?}");
    }

    let fill = |map: &mut SlotMap<u64>,
                model: &mut rustc_hash::FxHashMap<Handle, u64>,
                rng: &mut StdRng,
                count: usize| {
        for _ in 0..count {
            let val = rng.random();
            model.insert(map.insert(val), val);
        }
        assert_eq!(map.len(), model.len());
        for (&key, &val) in model.iter() {
            assert_eq!(map.get(key), Some(&val));
        }
    };

    let drain = |map: &mut SlotMap<u64>,
                 model: &mut rustc_hash::FxHashMap<Handle, u64>,
                 rng: &mut StdRng,
                 count: usize| {
        let mut removed = Vec::new();
        for _ in 0..count {
            let (&key, &val) = model.iter().choose(rng).unwrap();
            model.remove(&key);
            assert_eq!(map.remove(key), val);
            removed.push(key);
        }
        for key in removed {
            assert!(!map.contains(key));
        }
        assert_eq!(map.len(), model.len());
        for (&key, &val) in model.iter() {
            assert_eq!(map.get(key), Some(&val));
        }
    };

    fill(&mut map, &mut model, &mut rng, MAX_EL);
    drain(&mut map, &mut model, &mut rng, MAX_EL / 2);
    fill(&mut map, &mut model, &mut rng, MAX_EL);
    drain(&mut map, &mut model, &mut rng, MAX_EL + MAX_EL / 2);
    assert!(map.is_empty());

    fill(&mut map, &mut model, &mut rng, 50);
    drain(&mut map, &mut model, &mut rng, 30);

    map.clear();
    model.clear();
    assert_eq!(map.len(), 0);

    fill(&mut map, &mut model, &mut rng, 10000);
    drain(&mut map, &mut model, &mut rng, 5000);
    drain(&mut map, &mut model, &mut rng, 4999);
    drain(&mut map, &mut model, &mut rng, 1);
    assert!(map.is_empty());
}

#[test]
fn sparse_map_positions_stay_a_bijection() {
    let mut map = SparseMap::<()>::new();
    let mut live = Vec::new();

    let seed = rand::random();
    let mut rng = StdRng::from_seed(seed);

    scopeguard::defer_on_unwind! {
        println!("SEED: {seed:?}");
    }

    for _ in 0..1024 * 16 {
        if live.is_empty() || rng.random_bool(0.55) {
            live.push(map.insert());
        } else {
            let i = rng.random_range(0..live.len());
            let handle = live.swap_remove(i);
            let pos = map.remove(handle);
            assert!(pos <= map.len());
        }

        assert_eq!(map.len(), live.len());
    }

    let mut seen = vec![false; map.len()];
    for &handle in &live {
        let pos = map.get(handle).unwrap();
        assert!(!seen[pos], "two handles share dense position {pos}");
        seen[pos] = true;
        assert_eq!(map.handle_at(pos), Some(handle));
    }
    assert!(seen.into_iter().all(|s| s));
}
