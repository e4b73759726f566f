use switch_core::selector::BoundedSelector;

fn walk<const N: usize>(moves: &[bool]) {
    let mut selector = BoundedSelector::from_values([0u8; N]);
    for &forward in moves {
        let before = selector.current_index();
        let moved = if forward {
            selector.next(false)
        } else {
            selector.prev(false)
        };

        assert!(selector.current_index() < N);
        if !moved {
            assert_eq!(selector.current_index(), before, "failed move must not shift");
        }
    }
}

#[test]
fn non_cyclic_moves_stay_in_bounds() {
    // Deterministic pseudo-random walk.
    let mut seed = 0x2545_f491_u32;
    let moves: Vec<bool> = (0..256)
        .map(|_| {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            seed & 1 == 0
        })
        .collect();

    walk::<1>(&moves);
    walk::<2>(&moves);
    walk::<4>(&moves);
    walk::<7>(&moves);
}

#[test]
fn next_stops_at_last_slot() {
    let mut selector = BoundedSelector::from_values([15u16, 30, 60, 120]);
    for _ in 0..3 {
        assert!(selector.next(false));
    }

    assert!(!selector.next(false));
    assert_eq!(selector.current_index(), 3);
    assert_eq!(*selector.current(), 120);
}

#[test]
fn prev_stops_at_first_slot() {
    let mut selector = BoundedSelector::from_values(['a', 'b', 'c']);
    assert!(!selector.prev(false));
    assert_eq!(selector.current_index(), 0);
}

#[test]
fn cyclic_walk_returns_to_start() {
    let mut selector = BoundedSelector::from_values([1, 2, 3, 4, 5]);
    for start in 0..selector.capacity() {
        assert!(selector.set_index(start));
        for _ in 0..selector.capacity() {
            assert!(selector.next(true));
        }
        assert_eq!(selector.current_index(), start);

        for _ in 0..selector.capacity() {
            assert!(selector.prev(true));
        }
        assert_eq!(selector.current_index(), start);
    }
}

#[test]
fn single_slot_selector_wraps_onto_itself() {
    let mut selector = BoundedSelector::from_values([42]);
    assert!(selector.next(true));
    assert!(selector.prev(true));
    assert!(!selector.next(false));
    assert_eq!(selector.current_index(), 0);
}

#[test]
fn out_of_range_index_is_rejected() {
    let mut selector = BoundedSelector::<u16, 4>::new();
    assert!(selector.set_index(2));
    assert!(!selector.set_index(4));
    assert_eq!(selector.current_index(), 2);

    selector.set_current(90);
    assert_eq!(selector[2], 90);
    assert_eq!(selector.as_slice(), &[0, 0, 90, 0]);
}
