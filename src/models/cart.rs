// src/models/cart.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::order::Currency;

// --- 1. Item de Linha do Carrinho ---
// A identidade de um item é a tupla (productId, size, customName,
// customNumber, options). `quantity` é o ÚNICO campo que acumula na
// mesclagem; name/image/preços são cache do catálogo no momento do add.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub product_id: Uuid,
    pub size: String,
    pub custom_name: Option<String>,
    pub custom_number: Option<i32>,
    pub options: Option<String>,

    pub quantity: i32,

    pub name: String,
    pub image: Option<String>,
    pub unit_price: Decimal,
    pub unit_price_usd: Decimal,
}

impl CartLineItem {
    // Igualdade ESTRITA dos cinco campos de identidade. Nada de
    // normalização: "M" e "m" são itens diferentes, como no catálogo.
    pub fn same_identity(&self, other: &CartLineItem) -> bool {
        self.product_id == other.product_id
            && self.size == other.size
            && self.custom_name == other.custom_name
            && self.custom_number == other.custom_number
            && self.options == other.options
    }

    // Chave parcial usada pelas operações de edição/remoção da API.
    pub fn matches_key(&self, product_id: Uuid, size: &str) -> bool {
        self.product_id == product_id && self.size == size
    }

    pub fn unit_price_for(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Uyu => self.unit_price,
            Currency::Usd => self.unit_price_usd,
        }
    }

    pub fn line_total(&self, currency: Currency) -> Decimal {
        self.unit_price_for(currency) * Decimal::from(self.quantity)
    }
}

// --- 2. Mesclagem local x remoto (login) ---
// O acumulador parte do carrinho REMOTO (remoto ganha os empates de cache e
// mantém a ordem); cada item local soma quantidade num item de identidade
// igual ou é anexado ao final. Função total, sem condições de erro.
pub fn merge_cart_items(local: &[CartLineItem], remote: &[CartLineItem]) -> Vec<CartLineItem> {
    let mut merged: Vec<CartLineItem> = remote.to_vec();
    for item in local {
        match merged.iter_mut().find(|m| m.same_identity(item)) {
            Some(existing) => existing.quantity += item.quantity,
            None => merged.push(item.clone()),
        }
    }
    merged
}

// Adicionar usa a MESMA regra de identidade da mesclagem.
pub fn add_item(items: &mut Vec<CartLineItem>, new_item: CartLineItem) {
    match items.iter_mut().find(|i| i.same_identity(&new_item)) {
        Some(existing) => existing.quantity += new_item.quantity,
        None => items.push(new_item),
    }
}

// Payload de "adicionar ao carrinho". O padrão Option + required devolve 400
// com a lista de campos em vez do 422 seco do extrator de JSON.
#[derive(Debug, Deserialize, validator::Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddItemPayload {
    #[validate(required(message = "O id do produto é obrigatório."))]
    pub product_id: Option<Uuid>,

    #[validate(required(message = "O talle é obrigatório."))]
    #[validate(length(min = 1, message = "O talle é obrigatório."))]
    #[schema(example = "M")]
    pub size: Option<String>,

    // Personalização da camiseta, opcional.
    #[schema(example = "SUAREZ")]
    pub custom_name: Option<String>,
    #[schema(example = 9)]
    pub custom_number: Option<i32>,
    pub options: Option<String>,

    // Ausente vale 1.
    #[validate(range(min = 1, message = "A quantidade mínima é 1."))]
    pub quantity: Option<i32>,
}

// --- 3. Patch parcial de um item ---
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPatch {
    pub quantity: Option<i32>,
    pub custom_name: Option<String>,
    pub custom_number: Option<i32>,
    pub options: Option<String>,
}

// Aplica o patch a TODOS os itens com (productId, size) e em seguida descarta
// qualquer item com quantidade <= 0. Edição e remoção compartilham este
// caminho: patch com quantity = 0 É a remoção. Retorna quantos itens o patch
// atingiu (antes do descarte).
pub fn update_items(
    items: &mut Vec<CartLineItem>,
    product_id: Uuid,
    size: &str,
    patch: &CartItemPatch,
) -> usize {
    let mut touched = 0;
    for item in items.iter_mut().filter(|i| i.matches_key(product_id, size)) {
        if let Some(quantity) = patch.quantity {
            item.quantity = quantity;
        }
        if let Some(ref custom_name) = patch.custom_name {
            item.custom_name = Some(custom_name.clone());
        }
        if let Some(custom_number) = patch.custom_number {
            item.custom_number = Some(custom_number);
        }
        if let Some(ref options) = patch.options {
            item.options = Some(options.clone());
        }
        touched += 1;
    }
    items.retain(|i| i.quantity > 0);
    touched
}

// Remove TODOS os itens com (productId, size). Retorna quantos saíram.
pub fn remove_items(items: &mut Vec<CartLineItem>, product_id: Uuid, size: &str) -> usize {
    let before = items.len();
    items.retain(|i| !i.matches_key(product_id, size));
    before - items.len()
}

// --- 4. O documento de carrinho ---
// Uma linha da tabela `carts`. `version` cresce a cada escrita e é devolvida
// ao cliente para detecção de carrinho defasado entre abas/dispositivos.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[sqlx(json)]
    pub items: Vec<CartLineItem>,
    pub version: i64,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    // Carrinho "vazio" devolvido quando a identidade ainda não tem linha no
    // banco. Leituras nunca criam a linha.
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            version: 0,
            updated_at: Utc::now(),
        }
    }
}

// --- 5. Dono do carrinho ---
// Exatamente um carrinho autoritativo por identidade ativa: usuário
// autenticado (token) XOR sessão anônima (X-Session-Id).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOwner {
    User(Uuid),
    Session(Uuid),
}

impl CartOwner {
    pub fn kind(&self) -> &'static str {
        match self {
            CartOwner::User(_) => "user",
            CartOwner::Session(_) => "session",
        }
    }

    pub fn id(&self) -> Uuid {
        match self {
            CartOwner::User(id) | CartOwner::Session(id) => *id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product: Uuid, size: &str, quantity: i32) -> CartLineItem {
        CartLineItem {
            product_id: product,
            size: size.to_string(),
            custom_name: None,
            custom_number: None,
            options: None,
            quantity,
            name: "Camiseta Titular".to_string(),
            image: None,
            unit_price: Decimal::new(1990, 0),
            unit_price_usd: Decimal::new(49, 0),
        }
    }

    fn custom(product: Uuid, size: &str, quantity: i32, name: &str, number: i32) -> CartLineItem {
        CartLineItem {
            custom_name: Some(name.to_string()),
            custom_number: Some(number),
            ..item(product, size, quantity)
        }
    }

    #[test]
    fn identity_is_reflexive_and_ignores_quantity() {
        let p = Uuid::new_v4();
        let a = item(p, "M", 1);
        assert!(a.same_identity(&a));

        let b = item(p, "M", 7);
        assert!(a.same_identity(&b)); // só a quantidade difere
    }

    #[test]
    fn identity_distinguishes_customization() {
        let p = Uuid::new_v4();
        let plain = item(p, "M", 1);
        let named = custom(p, "M", 1, "SUAREZ", 9);
        let other_number = custom(p, "M", 1, "SUAREZ", 7);

        assert!(!plain.same_identity(&named));
        assert!(!named.same_identity(&other_number));
        assert!(named.same_identity(&custom(p, "M", 3, "SUAREZ", 9)));
    }

    #[test]
    fn merge_preserves_quantity_per_identity_class() {
        let p1 = Uuid::new_v4();
        let p2 = Uuid::new_v4();
        let local = vec![item(p1, "M", 2), item(p2, "S", 1)];
        let remote = vec![item(p1, "M", 3), item(p1, "L", 1)];

        let merged = merge_cart_items(&local, &remote);

        // p1/M: 2 + 3 = 5; p1/L só remoto; p2/S só local, anexado no final.
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[0].quantity, 5);
        assert_eq!(merged[1].size, "L");
        assert_eq!(merged[2].product_id, p2);
        assert_eq!(merged[2].quantity, 1);
    }

    #[test]
    fn merge_keeps_remote_order_and_cached_fields() {
        let p = Uuid::new_v4();
        let mut remote_item = item(p, "M", 1);
        remote_item.name = "Nome no remoto".to_string();
        let mut local_item = item(p, "M", 2);
        local_item.name = "Nome no local".to_string();

        let merged = merge_cart_items(&[local_item], &[remote_item]);

        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 3);
        // remoto ganha o empate dos campos de cache
        assert_eq!(merged[0].name, "Nome no remoto");
    }

    #[test]
    fn merge_with_empty_remote_keeps_local() {
        let p = Uuid::new_v4();
        let merged = merge_cart_items(&[item(p, "XL", 4)], &[]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].quantity, 4);
    }

    #[test]
    fn adding_twice_with_same_identity_accumulates() {
        let p = Uuid::new_v4();
        let mut items = Vec::new();
        add_item(&mut items, item(p, "M", 1));
        add_item(&mut items, item(p, "M", 1));

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 2);
    }

    #[test]
    fn adding_different_size_appends() {
        let p = Uuid::new_v4();
        let mut items = Vec::new();
        add_item(&mut items, item(p, "M", 1));
        add_item(&mut items, item(p, "L", 1));
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn patch_quantity_zero_removes_item() {
        let p = Uuid::new_v4();
        let mut items = vec![item(p, "M", 2), item(p, "L", 1)];

        let patch = CartItemPatch { quantity: Some(0), ..Default::default() };
        let touched = update_items(&mut items, p, "M", &patch);

        assert_eq!(touched, 1);
        assert_eq!(items.len(), 1);
        assert!(!items.iter().any(|i| i.size == "M"));
    }

    #[test]
    fn patch_updates_every_match() {
        let p = Uuid::new_v4();
        // mesma chave (produto, talle), identidades diferentes pelo customName
        let mut items = vec![custom(p, "M", 1, "SUAREZ", 9), custom(p, "M", 1, "VALVERDE", 15)];

        let patch = CartItemPatch { quantity: Some(3), ..Default::default() };
        let touched = update_items(&mut items, p, "M", &patch);

        assert_eq!(touched, 2);
        assert!(items.iter().all(|i| i.quantity == 3));
    }

    #[test]
    fn patch_can_change_customization() {
        let p = Uuid::new_v4();
        let mut items = vec![item(p, "M", 1)];

        let patch = CartItemPatch {
            custom_name: Some("CAVANI".to_string()),
            custom_number: Some(21),
            ..Default::default()
        };
        update_items(&mut items, p, "M", &patch);

        assert_eq!(items[0].custom_name.as_deref(), Some("CAVANI"));
        assert_eq!(items[0].custom_number, Some(21));
        assert_eq!(items[0].quantity, 1); // quantidade intacta
    }

    #[test]
    fn remove_drops_all_matches() {
        let p = Uuid::new_v4();
        let mut items = vec![
            custom(p, "M", 1, "SUAREZ", 9),
            custom(p, "M", 2, "GODIN", 3),
            item(p, "L", 1),
        ];

        let removed = remove_items(&mut items, p, "M");

        assert_eq!(removed, 2);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].size, "L");
    }

    #[test]
    fn line_total_uses_requested_currency() {
        let p = Uuid::new_v4();
        let i = item(p, "M", 3);
        assert_eq!(i.line_total(Currency::Uyu), Decimal::new(5970, 0));
        assert_eq!(i.line_total(Currency::Usd), Decimal::new(147, 0));
    }
}
