diesel::table! {
    use diesel::sql_types::*;

    agencies (id) {
        id -> Text,
        slug -> Text,
        name -> Text,
        url -> Nullable<Text>,
        timezone -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use postgis_diesel::sql_types::*;
    use diesel::sql_types::*;

    stops (id) {
        id -> Text,
        stop_id -> Text,
        agency_id -> Text,
        name -> Text,
        location -> Geometry,
        platform_code -> Nullable<Text>,
        wheelchair_accessible -> Bool,
        metadata -> Nullable<Jsonb>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use postgis_diesel::sql_types::*;
    use diesel::sql_types::*;

    routes (id) {
        id -> Text,
        route_id -> Text,
        agency_id -> Text,
        short_name -> Nullable<Text>,
        long_name -> Text,
        route_type -> Integer,
        color -> Text,
        text_color -> Text,
        shape -> Nullable<Geometry>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    trips (id) {
        id -> Text,
        trip_id -> Text,
        route_id -> Text,
        service_id -> Text,
        headsign -> Nullable<Text>,
        direction_id -> SmallInt,
        shape_id -> Nullable<Text>,
        wheelchair_accessible -> Bool,
        bikes_allowed -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    stop_times (id) {
        id -> Text,
        trip_id -> Text,
        stop_id -> Text,
        arrival_time -> Integer,
        departure_time -> Integer,
        stop_sequence -> Integer,
        pickup_type -> SmallInt,
        drop_off_type -> SmallInt,
    }
}

diesel::table! {
    use postgis_diesel::sql_types::*;
    use diesel::sql_types::*;

    vehicle_positions (time, vehicle_id) {
        time -> Timestamptz,
        vehicle_id -> Text,
        trip_id -> Nullable<Text>,
        route_id -> Nullable<Text>,
        location -> Geometry,
        bearing -> Double,
        speed -> Double,
        congestion_level -> Integer,
        occupancy_status -> Integer,
        metadata -> Nullable<Jsonb>,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    delay_events (id, time) {
        id -> Text,
        time -> Timestamptz,
        trip_id -> Nullable<Text>,
        stop_id -> Nullable<Text>,
        scheduled_arrival -> Nullable<Timestamptz>,
        actual_arrival -> Nullable<Timestamptz>,
        delay_seconds -> Integer,
        is_compensated -> Bool,
        compensation_sent_at -> Nullable<Timestamptz>,
        metadata -> Nullable<Jsonb>,
    }
}

diesel::table! {
    use postgis_diesel::sql_types::*;
    use diesel::sql_types::*;

    affiliates (id) {
        id -> Text,
        name -> Text,
        category -> Text,
        location -> Geometry,
        address -> Nullable<Text>,
        offer_text -> Text,
        offer_value -> Double,
        active -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    use diesel::sql_types::*;

    compensations (id) {
        id -> Text,
        user_id -> Text,
        delay_event_id -> Text,
        affiliate_id -> Text,
        code -> Text,
        issued_at -> Timestamptz,
        expires_at -> Timestamptz,
        redeemed_at -> Nullable<Timestamptz>,
        metadata -> Nullable<Jsonb>,
    }
}

diesel::joinable!(stops -> agencies (agency_id));
diesel::joinable!(routes -> agencies (agency_id));
diesel::joinable!(trips -> routes (route_id));
diesel::joinable!(stop_times -> trips (trip_id));
diesel::joinable!(stop_times -> stops (stop_id));

diesel::allow_tables_to_appear_in_same_query!(
    agencies,
    stops,
    routes,
    trips,
    stop_times,
    vehicle_positions,
    delay_events,
    affiliates,
    compensations,
);
