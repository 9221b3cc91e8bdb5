use chrono::NaiveTime;

/// Open window `[open_from, open_until]` covers both clock times. Dates are ignored:
/// a window spanning midnight or several days is judged by its endpoints' clock times.
pub fn is_open_for_window(
    open_from: NaiveTime,
    open_until: NaiveTime,
    dropoff_time_of_day: NaiveTime,
    pickup_time_of_day: NaiveTime,
) -> bool {
    open_from <= dropoff_time_of_day && open_until >= pickup_time_of_day
}
