use crate::error::Result;
use std::fs;
use std::path::Path;
use trading::Order;

/// Reads a JSON array of order requests.
pub fn load_orders(path: &Path) -> Result<Vec<Order>> {
    let text = fs::read_to_string(path)?;
    let orders: Vec<Order> = serde_json::from_str(&text)?;
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use trading::{OrderType, Side};

    #[test]
    fn test_load_orders() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"instrument": "X", "side": "Buy", "type": "Market", "volume": 1.0}},
                {{"instrument": "X", "side": "Sell", "type": "Stop", "volume": 1.0, "price": 95.0}}
            ]"#
        )
        .unwrap();

        let orders = load_orders(file.path()).unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(orders[1].side(), Side::Sell);
        assert_eq!(orders[1].order_type(), OrderType::Stop);
        assert_ne!(orders[0].id(), orders[1].id());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_orders(Path::new("/definitely/not/here.json")).is_err());
    }
}
