use crate::domain::models::service::Service;

/// Hourly base the estimate starts from. A special price only wins when it is
/// a usable, non-zero amount; anything else falls back to the base price.
pub fn effective_base_price(service: &Service) -> f64 {
    match service.special_price {
        Some(price) if price.is_finite() && price != 0.0 => price,
        _ => service.base_price,
    }
}

/// Estimated hourly total for a draft: the effective base plus every selected
/// add-on. Ids that do not belong to `service` contribute nothing.
pub fn calculate_total_price<'a, I>(service: &Service, selected: I) -> f64
where
    I: IntoIterator<Item = &'a i64>,
{
    let add_ons: f64 = selected
        .into_iter()
        .filter_map(|id| service.item(*id))
        .map(|item| item.price)
        .sum();

    effective_base_price(service) + add_ons
}
