use std::collections::VecDeque;
use tracing::{debug, info};

use crate::error::{PlaybackError, Result};
use crate::track::QueueItem;

/// Cola de reproducción de una sesión: pendientes, actual e historial.
///
/// Las posiciones expuestas son 1-indexadas, como las ve el usuario.
/// Toda operación valida antes de mutar; un error nunca deja la cola
/// a medio camino. Pendientes e historial son disjuntos: un item solo
/// pasa de uno a otro avanzando o retrocediendo.
#[derive(Debug)]
pub struct TrackQueue {
    items: VecDeque<QueueItem>,
    current: Option<QueueItem>,
    history: Vec<QueueItem>,
    max_size: usize,
}

impl TrackQueue {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            current: None,
            history: Vec::new(),
            max_size,
        }
    }

    /// Agrega un track al final de la cola, o al frente si `front`.
    pub fn add(&mut self, item: QueueItem, front: bool) -> Result<()> {
        if self.items.len() >= self.max_size {
            return Err(PlaybackError::validation(format!(
                "la cola está llena (máximo {} canciones)",
                self.max_size
            )));
        }

        info!("➕ Agregado a la cola: {}", item.title());
        if front {
            self.items.push_front(item);
        } else {
            self.items.push_back(item);
        }

        Ok(())
    }

    /// Remueve `range` tracks desde la posición 1-indexada `position`.
    ///
    /// Devuelve los removidos, en orden. Sin mutación si el rango no existe.
    pub fn remove_range(&mut self, position: usize, range: usize) -> Result<Vec<QueueItem>> {
        if position < 1 || range < 1 {
            return Err(PlaybackError::validation(
                "la posición y el rango deben ser al menos 1",
            ));
        }

        let start = position - 1;
        let end = start
            .checked_add(range)
            .ok_or_else(|| PlaybackError::validation("rango demasiado grande"))?;

        if end > self.items.len() {
            return Err(PlaybackError::not_found(format!(
                "no hay {} canciones a partir de la posición {}",
                range, position
            )));
        }

        let removed: Vec<QueueItem> = self.items.drain(start..end).collect();
        info!("🗑️ Removidas {} canciones de la cola", removed.len());
        Ok(removed)
    }

    /// Mueve el track en `from` a la posición `to` (ambas 1-indexadas).
    ///
    /// Devuelve el título del track movido.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<String> {
        if from < 1 || to < 1 {
            return Err(PlaybackError::validation(
                "las posiciones deben ser al menos 1",
            ));
        }

        let from0 = from - 1;
        let to0 = to - 1;

        if from0 >= self.items.len() || to0 >= self.items.len() {
            return Err(PlaybackError::not_found("posición fuera de la cola"));
        }

        if from0 != to0 {
            let item = self
                .items
                .remove(from0)
                .ok_or_else(|| PlaybackError::not_found("posición fuera de la cola"))?;
            let title = item.title().to_string();
            self.items.insert(to0, item);
            debug!("📍 Track movido de {} a {}: {}", from, to, title);
            return Ok(title);
        }

        Ok(self.items[from0].title().to_string())
    }

    /// Avanza `n` veces: cada paso empuja el actual al historial y toma el
    /// frente de los pendientes como nuevo actual.
    ///
    /// Falla sin avance parcial si no hay actual o quedan menos de `n`
    /// pendientes.
    pub fn forward(&mut self, n: usize) -> Result<()> {
        if n < 1 {
            return Err(PlaybackError::validation(
                "el número de saltos debe ser al menos 1",
            ));
        }
        if self.current.is_none() {
            return Err(PlaybackError::invalid("no hay canción en reproducción"));
        }
        if self.items.len() < n {
            return Err(PlaybackError::invalid(format!(
                "no hay {} canciones para saltar",
                n
            )));
        }

        for _ in 0..n {
            if let Some(next) = self.items.pop_front() {
                if let Some(prev) = self.current.replace(next) {
                    self.history.push(prev);
                }
            }
        }

        debug!("⏭️ Avanzadas {} posiciones", n);
        Ok(())
    }

    /// Retrocede un paso: el último del historial pasa a ser el actual y el
    /// actual anterior vuelve al frente de los pendientes.
    pub fn rewind(&mut self) -> Result<()> {
        let prev = self
            .history
            .pop()
            .ok_or_else(|| PlaybackError::invalid("no hay canciones anteriores"))?;

        if let Some(cur) = self.current.take() {
            self.items.push_front(cur);
        }
        self.current = Some(prev);

        debug!("⏮️ Retrocedida una posición");
        Ok(())
    }

    /// Promueve el frente de los pendientes a actual cuando no hay actual.
    pub fn promote_next(&mut self) -> Option<&QueueItem> {
        if self.current.is_none() {
            self.current = self.items.pop_front();
        }
        self.current.as_ref()
    }

    /// Fin natural del track actual: pasa al historial y toma el siguiente.
    ///
    /// Devuelve el nuevo actual, o `None` si la cola quedó seca.
    pub fn advance_natural(&mut self) -> Option<&QueueItem> {
        if let Some(prev) = self.current.take() {
            self.history.push(prev);
        }
        self.current = self.items.pop_front();
        self.current.as_ref()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.history.clear();
        self.current = None;
        info!("🗑️ Cola e historial limpiados");
    }

    pub fn current(&self) -> Option<&QueueItem> {
        self.current.as_ref()
    }

    /// Pendientes en orden, sin el actual.
    pub fn pending(&self) -> Vec<QueueItem> {
        self.items.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `true` cuando no hay ni actual ni pendientes.
    pub fn is_drained(&self) -> bool {
        self.items.is_empty() && self.current.is_none()
    }
}
