#[cfg(test)]
mod tests {
    use crate::db::{
        clear_bench, clear_bookings, delete_bench_entry, delete_booking, get_all_bookings,
        get_bench, get_match_info, insert_bench_entry, update_booking, upsert_booking,
        upsert_match_info,
    };
    use crate::error::AppError;
    use crate::models::{
        BookingRow, DeviceId, MatchInfo, PaymentStatus, PositionKey, PositionPatch, Team,
    };
    use crate::test::test_utils::TestDbBuilder;

    fn booking(team: Team, key: PositionKey, name: &str, device: &str) -> BookingRow {
        BookingRow {
            team,
            key,
            name: name.to_string(),
            rating: None,
            tags: Vec::new(),
            note: String::new(),
            payment: PaymentStatus::Unpaid,
            device: Some(DeviceId::from(device)),
        }
    }

    #[rocket::async_test]
    async fn test_upsert_is_last_write_wins() {
        let test_db = TestDbBuilder::new().build().await.unwrap();
        let pool = &test_db.pool;

        upsert_booking(pool, &booking(Team::Red, PositionKey::Gk, "Sami", "x"))
            .await
            .unwrap();
        upsert_booking(pool, &booking(Team::Red, PositionKey::Gk, "Noor", "y"))
            .await
            .unwrap();
        upsert_booking(pool, &booking(Team::Green, PositionKey::Gk, "Lee", "z"))
            .await
            .unwrap();

        let rows = get_all_bookings(pool).await.unwrap();

        assert_eq!(rows.len(), 2);
        let red_gk = rows
            .iter()
            .find(|r| r.team == Team::Red && r.key == PositionKey::Gk)
            .unwrap();
        assert_eq!(red_gk.name, "Noor");
        assert_eq!(red_gk.device, Some(DeviceId::from("y")));
    }

    #[rocket::async_test]
    async fn test_partial_update_touches_only_given_fields() {
        let test_db = TestDbBuilder::new().build().await.unwrap();
        let pool = &test_db.pool;

        let mut row = booking(Team::Green, PositionKey::Cm, "Sami", "x");
        row.note = "bringing the ball".to_string();
        upsert_booking(pool, &row).await.unwrap();

        update_booking(
            pool,
            Team::Green,
            PositionKey::Cm,
            &PositionPatch {
                rating: Some(Some(7)),
                tags: Some(vec!["engine".into(), "left foot".into()]),
                payment: Some(PaymentStatus::Paid),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stored = get_all_bookings(pool).await.unwrap().remove(0);
        assert_eq!(stored.rating, Some(7));
        assert_eq!(stored.tags, vec!["engine".to_string(), "left foot".to_string()]);
        assert_eq!(stored.payment, PaymentStatus::Paid);
        assert_eq!(stored.note, "bringing the ball");
        assert_eq!(stored.name, "Sami");

        update_booking(
            pool,
            Team::Green,
            PositionKey::Cm,
            &PositionPatch {
                rating: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let stored = get_all_bookings(pool).await.unwrap().remove(0);
        assert_eq!(stored.rating, None);
    }

    #[rocket::async_test]
    async fn test_update_of_missing_booking_is_not_found() {
        let test_db = TestDbBuilder::new().build().await.unwrap();

        let result = update_booking(
            &test_db.pool,
            Team::Red,
            PositionKey::St,
            &PositionPatch {
                note: Some("hello".into()),
                ..Default::default()
            },
        )
        .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[rocket::async_test]
    async fn test_delete_and_clear_bookings() {
        let test_db = TestDbBuilder::new()
            .booking(Team::Red, PositionKey::Gk, "Sami", Some("x"))
            .booking(Team::Red, PositionKey::St, "Noor", Some("y"))
            .booking(Team::Green, PositionKey::Lb, "Lee", None)
            .build()
            .await
            .unwrap();
        let pool = &test_db.pool;

        delete_booking(pool, Team::Red, PositionKey::Gk).await.unwrap();
        assert_eq!(get_all_bookings(pool).await.unwrap().len(), 2);

        assert_eq!(clear_bookings(pool).await.unwrap(), 2);
        assert!(get_all_bookings(pool).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn test_bench_keeps_insertion_order() {
        let test_db = TestDbBuilder::new()
            .bench("Alice", Some("a"))
            .bench("Bob", None)
            .build()
            .await
            .unwrap();
        let pool = &test_db.pool;

        let id = insert_bench_entry(pool, "Cleo", Some("c")).await.unwrap();
        assert!(id > test_db.bench_ids[1]);

        let names: Vec<String> = get_bench(pool)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Alice", "Bob", "Cleo"]);

        delete_bench_entry(pool, test_db.bench_ids[0]).await.unwrap();
        let bench = get_bench(pool).await.unwrap();
        assert_eq!(bench[0].name, "Bob");
        assert_eq!(bench[0].device, None);

        assert_eq!(clear_bench(pool).await.unwrap(), 2);
        assert!(get_bench(pool).await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn test_match_info_singleton() {
        let test_db = TestDbBuilder::new().build().await.unwrap();
        let pool = &test_db.pool;

        assert_eq!(get_match_info(pool).await.unwrap(), None);

        let info = MatchInfo {
            name: "Derby".into(),
            venue: "North pitch".into(),
            kickoff: "19:00".into(),
        };
        upsert_match_info(pool, &info).await.unwrap();
        upsert_match_info(
            pool,
            &MatchInfo {
                venue: "South pitch".into(),
                ..info.clone()
            },
        )
        .await
        .unwrap();

        let stored = get_match_info(pool).await.unwrap().unwrap();
        assert_eq!(stored.name, "Derby");
        assert_eq!(stored.venue, "South pitch");
    }
}
