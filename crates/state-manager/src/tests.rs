#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::prelude::*;
    use crate::{get_nested, reduce, remember_with_key};

    fn same_at(a: &Record, b: &Record, key: &str) -> bool {
        a.get(key).zip(b.get(key)).is_some_and(|(x, y)| x.same(y))
    }

    fn counter(m: &Manager) -> Rc<RefCell<usize>> {
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        m.subscribe(move |_| *h.borrow_mut() += 1);
        hits
    }

    #[test]
    fn update_with_same_value_returns_same_state() {
        let s = record! { "a" => 1, "b" => "x" };
        let out = reduce(&s, Action::update("a", 1));
        assert!(out.ptr_eq(&s));
    }

    #[test]
    fn update_with_new_value_shares_other_keys() {
        let s = record! { "a" => 1, "b" => record! { "deep" => true } };
        let out = reduce(&s, Action::update("a", 2));
        assert!(!out.ptr_eq(&s));
        assert_eq!(out.get("a"), Some(&Value::from(2)));
        assert!(same_at(&out, &s, "b"));
    }

    #[test]
    fn update_of_absent_key_adds_it() {
        let s = record! { "a" => 1 };
        let out = reduce(&s, Action::update("z", Value::Null));
        assert_eq!(out.get("z"), Some(&Value::Null));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn update_with_updater_sees_previous_value() {
        let s = record! { "n" => 41 };
        let out = reduce(
            &s,
            Action::update_with("n", |prev| {
                Value::from(prev.and_then(Value::as_f64).unwrap_or(0.0) + 1.0)
            }),
        );
        assert_eq!(out.get("n"), Some(&Value::from(42)));
    }

    #[test]
    fn updater_returning_current_container_is_noop() {
        let s = record! { "list" => seq![1, 2] };
        let out = reduce(
            &s,
            Action::update_with("list", |prev| prev.cloned().unwrap_or_default()),
        );
        assert!(out.ptr_eq(&s));
    }

    #[test]
    fn equal_but_distinct_container_is_a_change() {
        let s = record! { "list" => seq![1, 2] };
        let out = reduce(&s, Action::update("list", seq![1, 2]));
        assert!(!out.ptr_eq(&s));
        assert_eq!(out, s);
    }

    #[test]
    fn nan_is_never_a_noop() {
        let s = record! { "x" => f64::NAN };
        let out = reduce(&s, Action::update("x", f64::NAN));
        assert!(!out.ptr_eq(&s));
    }

    #[test]
    fn deep_update_rebuilds_only_the_path() {
        let s = record! {
            "a" => record! { "b" => record! { "c" => 1, "d" => record! { "k" => 0 } }, "e" => record! { "f" => 3 } },
            "g" => seq![1],
        };
        let out = reduce(&s, Action::deep_update("a.b.c", 5));

        assert_eq!(
            out,
            record! {
                "a" => record! { "b" => record! { "c" => 5, "d" => record! { "k" => 0 } }, "e" => record! { "f" => 3 } },
                "g" => seq![1],
            }
        );
        let path = |p: &str| Path::parse(p);
        let old = Value::Map(s.clone());
        let new = Value::Map(out.clone());
        for shared in ["a.e", "a.b.d", "g"] {
            let before = get_nested(&old, &path(shared));
            let after = get_nested(&new, &path(shared));
            assert!(before.zip(after).is_some_and(|(x, y)| x.same(y)), "{shared}");
        }
        for rebuilt in ["a", "a.b"] {
            let before = get_nested(&old, &path(rebuilt));
            let after = get_nested(&new, &path(rebuilt));
            assert!(!before.zip(after).is_some_and(|(x, y)| x.same(y)), "{rebuilt}");
        }
    }

    #[test]
    fn deep_update_sequence_index_keeps_sequence() {
        let s = record! { "list" => seq![0, 1, 2, 3] };
        let out = reduce(&s, Action::deep_update("list[2]", 9));
        assert_eq!(out, record! { "list" => seq![0, 1, 9, 3] });
        let before = s.get("list").and_then(Value::as_seq);
        let after = out.get("list").and_then(Value::as_seq);
        assert!(!before.zip(after).is_some_and(|(x, y)| x.ptr_eq(y)));
    }

    #[test]
    fn deep_update_same_value_is_noop() {
        let s = record! { "a" => record! { "b" => "x" } };
        let out = reduce(&s, Action::deep_update("a.b", "x"));
        assert!(out.ptr_eq(&s));
    }

    #[test]
    fn deep_update_creates_missing_intermediates() {
        let s = record! { "other" => 1 };
        let out = reduce(&s, Action::deep_update("rows[0].cells.1", "hi"));
        assert_eq!(
            out.get("rows"),
            Some(&Value::from(seq![record! { "cells" => seq![Value::Null, "hi"] }]))
        );
    }

    #[test]
    fn deep_update_at_huge_index_degrades_to_keys() {
        let s = record! { "list" => seq![0, 1] };
        let out = reduce(&s, Action::deep_update("list.18446744073709551615", 1));
        assert_eq!(
            out.get("list"),
            Some(&Value::from(record! { "0" => 0, "1" => 1, "18446744073709551615" => 1 }))
        );

        let out = reduce(&s, Action::deep_update("list.4000000000", 1));
        assert_eq!(
            out.get("list"),
            Some(&Value::from(record! { "0" => 0, "1" => 1, "4000000000" => 1 }))
        );
    }

    #[test]
    fn deep_update_through_null_creates_mapping() {
        let s = record! { "a" => Value::Null };
        let out = reduce(&s, Action::deep_update("a[0]", 1));
        assert_eq!(out, record! { "a" => record! { "0" => 1 } });
    }

    #[test]
    fn record_keys_iterate_sorted() {
        let r = record! { "b" => 1, "a" => 2, "c" => 3 };
        assert_eq!(r.keys().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(r.to_string(), "{a: 2, b: 1, c: 3}");
    }

    #[test]
    fn deep_update_with_updater_sees_nested_value() {
        let s = record! { "user" => record! { "tags" => seq!["a"] } };
        let out = reduce(
            &s,
            Action::deep_update_with("user.tags", |prev| {
                let mut tags: Vec<Value> = prev
                    .and_then(Value::as_seq)
                    .map(|s| s.iter().cloned().collect())
                    .unwrap_or_default();
                tags.push("b".into());
                Value::from(tags)
            }),
        );
        assert_eq!(out, record! { "user" => record! { "tags" => seq!["a", "b"] } });
    }

    #[test]
    fn deep_update_root_replaces_with_mapping_only() {
        let s = record! { "a" => 1 };
        let replaced = reduce(&s, Action::deep_update("", record! { "b" => 2 }));
        assert_eq!(replaced, record! { "b" => 2 });

        let rejected = reduce(&s, Action::deep_update("", 5));
        assert!(rejected.ptr_eq(&s));

        let identity = reduce(
            &s,
            Action::deep_update_with("", |prev| prev.cloned().unwrap_or_default()),
        );
        assert!(identity.ptr_eq(&s));
    }

    #[test]
    fn bulk_update_with_current_values_is_noop() {
        let s = record! { "x" => 1, "y" => seq![1], "z" => 3 };
        let updates: Record = ["x", "y"]
            .into_iter()
            .filter_map(|k| s.get(k).map(|v| (k, v.clone())))
            .collect();
        assert!(reduce(&s, Action::bulk(updates)).ptr_eq(&s));
        assert!(reduce(&s, Action::bulk(Record::new())).ptr_eq(&s));
    }

    #[test]
    fn bulk_update_merges_all_keys_when_one_differs() {
        let s = record! { "x" => 1, "y" => 2 };
        let out = reduce(&s, Action::bulk(record! { "x" => 1, "y" => 3, "w" => 4 }));
        assert_eq!(out, record! { "x" => 1, "y" => 3, "w" => 4 });
    }

    #[test]
    fn reset_without_argument_clones() {
        let s = record! { "a" => record! { "n" => 1 } };
        let out = reduce(&s, Action::reset(None));
        assert!(!out.ptr_eq(&s));
        assert!(same_at(&out, &s, "a"));
        assert_eq!(out, s);
    }

    #[test]
    fn reset_with_argument_merges_onto_current() {
        let s = record! { "a" => 1, "b" => 2 };
        let out = reduce(&s, Action::reset(record! { "b" => 0 }));
        assert_eq!(out, record! { "a" => 1, "b" => 0 });
    }

    #[test]
    fn unrecognized_action_leaves_state() {
        let s = record! { "a" => 1 };
        assert!(reduce(&s, Action::Unrecognized("TOGGLE".into())).ptr_eq(&s));
    }

    #[test]
    fn repeated_update_is_stable_after_first() {
        let m = Manager::new(record! { "a" => 0 });
        m.update_state("a", "v");
        let first = m.state();
        m.update_state("a", "v");
        assert!(m.state().ptr_eq(&first));
        assert_eq!(m.version(), 1);
    }

    #[test]
    fn subscribers_run_once_per_accepted_transition() {
        let m = Manager::new(record! { "a" => 0, "b" => 0 });
        let hits = counter(&m);

        m.update_state("a", 0);
        m.bulk_update(record! { "a" => 0, "b" => 0 });
        m.deep_update_state("a", 0);
        assert_eq!(*hits.borrow(), 0);

        m.update_state("a", 1);
        m.deep_update_state("c.d", true);
        m.reset_state(None);
        assert_eq!(*hits.borrow(), 3);
        assert_eq!(m.version(), 3);
    }

    #[test]
    fn subscriber_receives_new_state() {
        let m = Manager::new(record! { "a" => 0 });
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        m.subscribe(move |state| s.borrow_mut().push(state.get("a").cloned()));
        m.update_state("a", 1);
        m.update_state("a", 2);
        assert_eq!(*seen.borrow(), vec![Some(Value::from(1)), Some(Value::from(2))]);
    }

    #[test]
    fn cancelled_subscription_stops_notifications() {
        let m = Manager::new(record! { "a" => 0 });
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let sub = m.subscribe(move |_| *h.borrow_mut() += 1);
        m.update_state("a", 1);
        sub.cancel();
        sub.cancel();
        assert!(!sub.is_active());
        m.update_state("a", 2);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(m.subscriber_count(), 0);
    }

    #[test]
    fn dispatch_from_subscriber_is_queued_in_order() {
        let m = Manager::new(record! { "a" => 0, "log" => seq![] });
        let handle = m.clone();
        m.subscribe(move |state| {
            if state.get("a") == Some(&Value::from(1)) {
                handle.update_state("a", 2);
                handle.update_state("a", 3);
            }
        });
        let order = Rc::new(RefCell::new(Vec::new()));
        let o = order.clone();
        m.subscribe(move |state| o.borrow_mut().push(state.get("a").cloned()));

        m.update_state("a", 1);
        assert_eq!(m.get("a"), Some(Value::from(3)));
        assert_eq!(
            *order.borrow(),
            vec![Some(Value::from(1)), Some(Value::from(2)), Some(Value::from(3))]
        );
    }

    #[test]
    fn panicking_updater_discards_queued_actions() {
        use std::cell::Cell;
        use std::panic::{AssertUnwindSafe, catch_unwind};

        let m = Manager::new(record! { "a" => 0 });
        let handle = m.clone();
        let armed = Rc::new(Cell::new(true));
        let flag = armed.clone();
        m.subscribe(move |_| {
            if flag.replace(false) {
                handle.update_state_with("a", |_| panic!("updater failed"));
                handle.update_state("b", 1);
            }
        });

        let result = catch_unwind(AssertUnwindSafe(|| m.update_state("a", 1)));
        assert!(result.is_err());
        assert!(!armed.get());

        m.update_state("c", 1);
        assert_eq!(m.get("a"), Some(Value::from(1)));
        assert_eq!(m.get("b"), None);
        assert_eq!(m.get("c"), Some(Value::from(1)));
    }

    #[test]
    fn updater_may_read_the_manager() {
        let m = Manager::new(record! { "a" => 1, "b" => 10 });
        let handle = m.clone();
        m.update_state_with("a", move |prev| {
            let b = handle.get("b").and_then(|v| v.as_f64()).unwrap_or(0.0);
            Value::from(prev.and_then(Value::as_f64).unwrap_or(0.0) + b)
        });
        assert_eq!(m.get("a"), Some(Value::from(11)));
    }

    #[test]
    fn get_state_tracks_transitions() {
        let m = Manager::new(record! { "a" => 1 });
        let s1 = m.get_state();
        assert!(m.get_state().ptr_eq(&s1));
        m.update_state("a", 2);
        assert!(!m.get_state().ptr_eq(&s1));
        assert!(m.initial_state().ptr_eq(&s1));
    }

    #[test]
    fn reset_merge_current_does_not_restore_dropped_values() {
        let m = Manager::new(record! { "a" => 1, "b" => 2 });
        m.update_state("b", 20);
        m.reset_state(record! { "a" => 0 });
        assert_eq!(m.state(), record! { "a" => 0, "b" => 20 });
    }

    #[test]
    fn reset_restore_initial_uses_captured_state() {
        let config = ManagerConfig::new()
            .reset_policy(ResetPolicy::RestoreInitial)
            .label("form");
        let m = Manager::with_config(record! { "a" => 1, "b" => 2 }, config);
        m.update_state("b", 20);
        m.update_state("c", 30);
        m.reset_state(record! { "a" => 0 });
        assert_eq!(m.state(), record! { "a" => 0, "b" => 2 });

        m.reset_state(None);
        assert_eq!(m.state(), m.initial_state());
        assert!(!m.state().ptr_eq(&m.initial_state()));
    }

    #[test]
    fn manager_clones_share_the_container() {
        let m = Manager::new(record! { "a" => 1 });
        let other = m.clone();
        other.update_state("a", 2);
        assert!(m.ptr_eq(&other));
        assert_eq!(m.get("a"), Some(Value::from(2)));
        assert!(!m.ptr_eq(&Manager::new(Record::new())));
    }

    #[test]
    fn composition_remembers_manager_across_passes() {
        let composition = Composition::new();
        let inits = Rc::new(RefCell::new(0));

        let pass = || {
            let inits = inits.clone();
            composition.run(move || {
                use_manager(move || {
                    *inits.borrow_mut() += 1;
                    record! { "count" => 0 }
                })
            })
        };

        let first = pass();
        first.update_state("count", 5);
        let second = pass();
        assert!(first.ptr_eq(&second));
        assert_eq!(second.get("count"), Some(Value::from(5)));
        assert_eq!(*inits.borrow(), 1);
        assert_eq!(composition.slot_count(), 1);
    }

    #[test]
    fn keyed_managers_are_independent() {
        let composition = Composition::new();
        let (a, b) = composition.run(|| {
            (
                use_manager_with_key("a", || record! { "v" => 1 }),
                use_manager_with_key("b", || record! { "v" => 2 }),
            )
        });
        let again = composition.run(|| use_manager_with_key("a", || record! { "v" => 99 }));
        assert!(again.ptr_eq(&a));
        assert!(!a.ptr_eq(&b));
    }

    #[test]
    fn remember_with_key_replaces_on_type_change() {
        let composition = Composition::new();
        composition.run(|| {
            let n = remember_with_key("slot", || 1u32);
            assert_eq!(*n, 1);
            let s = remember_with_key("slot", || "text");
            assert_eq!(*s, "text");
        });
    }

    #[test]
    fn disposing_composition_cancels_scoped_subscriptions() {
        let composition = Composition::new();
        let hits = Rc::new(RefCell::new(0));
        let m = composition.run(|| {
            let m = use_manager(|| record! { "a" => 0 });
            let h = hits.clone();
            m.subscribe(move |_| *h.borrow_mut() += 1);
            m
        });
        m.update_state("a", 1);
        assert_eq!(*hits.borrow(), 1);

        composition.dispose();
        m.update_state("a", 2);
        assert_eq!(*hits.borrow(), 1);
        assert_eq!(m.subscriber_count(), 0);
    }

    #[test]
    fn child_scope_disposes_before_parent() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let parent = Scope::new();
        let child = parent.child();
        let o = order.clone();
        parent.add_disposer(move || o.borrow_mut().push("parent"));
        let o = order.clone();
        child.add_disposer(move || o.borrow_mut().push("child"));
        parent.dispose();
        assert_eq!(*order.borrow(), vec!["child", "parent"]);
    }

    #[test]
    fn remember_outside_composition_does_not_persist() {
        let a = use_manager(|| record! { "a" => 1 });
        let b = use_manager(|| record! { "a" => 1 });
        assert!(!a.ptr_eq(&b));
    }

    #[cfg(feature = "serde")]
    mod json {
        use serde::{Deserialize, Serialize};
        use serde_json::json;

        use crate::prelude::*;

        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Form {
            name: String,
            age: u32,
            tags: Vec<String>,
        }

        #[test]
        fn typed_round_trip_through_manager() {
            let form = Form {
                name: "Ada".into(),
                age: 36,
                tags: vec!["math".into()],
            };
            let m = Manager::new(Record::from_typed(&form).unwrap());
            m.deep_update_state("tags[1]", "engines");
            m.update_state("age", 37);
            let out: Form = m.state().to_typed().unwrap();
            assert_eq!(
                out,
                Form {
                    name: "Ada".into(),
                    age: 37,
                    tags: vec!["math".into(), "engines".into()],
                }
            );
        }

        #[test]
        fn non_object_root_is_rejected() {
            let err = Record::from_json(json!([1, 2])).unwrap_err();
            assert!(matches!(err, StateError::NotAMapping { found: "sequence" }));
        }

        #[test]
        fn numbers_serialize_as_integers_when_integral() {
            let r = record! { "i" => 3, "f" => 1.5, "s" => seq![true, Value::Null] };
            assert_eq!(r.to_json(), json!({"i": 3, "f": 1.5, "s": [true, null]}));
            assert_eq!(serde_json::to_value(&r).unwrap(), r.to_json());
        }

        #[test]
        fn integers_stop_at_exact_f64_range() {
            let r = record! { "max" => 9_007_199_254_740_991.0, "over" => 9_007_199_254_740_992.0 };
            assert_eq!(
                r.to_json(),
                json!({"max": 9_007_199_254_740_991_i64, "over": 9_007_199_254_740_992.0})
            );
        }

        #[test]
        fn wire_actions_decode_and_apply() {
            let m = Manager::new(record! { "a" => 1, "user" => record! { "name" => "x" } });
            let wire = [
                json!({"type": "UPDATE", "key": "a", "value": 2}),
                json!({"type": "DEEP_UPDATE", "path": "user.name", "value": "y"}),
                json!({"type": "BULK_UPDATE", "updates": {"b": [1]}}),
                json!({"type": "RESET", "newState": null}),
            ];
            for action in &wire {
                m.dispatch(Action::from_json(action).unwrap());
            }
            assert_eq!(
                m.state().to_json(),
                json!({"a": 2, "b": [1], "user": {"name": "y"}})
            );
            assert_eq!(m.version(), 4);
        }

        #[test]
        fn unknown_wire_tag_is_ignored() {
            let m = Manager::new(record! { "a" => 1 });
            let before = m.state();
            let action = Action::from_json(&json!({"type": "UNDO"})).unwrap();
            assert_eq!(action.tag(), "UNDO");
            m.dispatch(action);
            assert!(m.state().ptr_eq(&before));
            assert_eq!(m.version(), 0);
        }

        #[test]
        fn malformed_wire_actions_are_errors() {
            assert!(matches!(
                Action::from_json(&json!({"key": "a"})),
                Err(StateError::MissingField("type"))
            ));
            assert!(matches!(
                Action::from_json(&json!({"type": "UPDATE", "key": "a"})),
                Err(StateError::MissingField("value"))
            ));
            assert!(matches!(
                Action::from_json(&json!({"type": "BULK_UPDATE", "updates": 3})),
                Err(StateError::InvalidField { field: "updates", .. })
            ));
            assert!(matches!(
                Action::from_json(&json!("RESET")),
                Err(StateError::InvalidField { field: "action", .. })
            ));
        }
    }
}
