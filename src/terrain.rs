use crate::hex::HexCoord;

/// Сетка символов местности. Все этапы генерации правят её на месте.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerrainGrid {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<char>,
}

impl TerrainGrid {
    pub fn new(width: u32, height: u32, fill: char) -> Self {
        Self {
            width,
            height,
            cells: vec![fill; (width * height) as usize],
        }
    }

    pub fn on_board(&self, loc: HexCoord) -> bool {
        loc.x >= 0 && loc.y >= 0 && loc.x < self.width as i32 && loc.y < self.height as i32
    }

    fn index(&self, loc: HexCoord) -> usize {
        loc.y as usize * self.width as usize + loc.x as usize
    }

    /// Символ клетки; `None` за пределами карты
    pub fn get(&self, loc: HexCoord) -> Option<char> {
        self.on_board(loc).then(|| self.cells[self.index(loc)])
    }

    /// Записывает символ; клетки за пределами карты молча пропускаются
    pub fn set(&mut self, loc: HexCoord, terrain: char) {
        if self.on_board(loc) {
            let idx = self.index(loc);
            self.cells[idx] = terrain;
        }
    }

    pub fn count(&self, terrain: char) -> usize {
        self.cells.iter().filter(|&&c| c == terrain).count()
    }

    /// Вырезает прямоугольник и сериализует его построчно через `\n`
    pub fn crop_to_string(&self, x0: u32, y0: u32, width: u32, height: u32) -> String {
        let mut out = String::with_capacity(((width + 1) * height) as usize);
        for y in y0..y0 + height {
            if y > y0 {
                out.push('\n');
            }
            let row = (y * self.width) as usize;
            out.extend(&self.cells[row + x0 as usize..row + (x0 + width) as usize]);
        }
        out
    }

    pub fn to_text(&self) -> String {
        self.crop_to_string(0, 0, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn off_board_reads_are_none_and_writes_are_ignored() {
        let mut grid = TerrainGrid::new(4, 3, 'g');
        assert_eq!(grid.get(HexCoord::new(-1, 0)), None);
        assert_eq!(grid.get(HexCoord::new(4, 0)), None);
        grid.set(HexCoord::new(9, 9), 'c');
        assert_eq!(grid.count('g'), 12);
    }

    #[test]
    fn crop_extracts_inner_rectangle() {
        let mut grid = TerrainGrid::new(6, 6, '.');
        grid.set(HexCoord::new(2, 2), 'a');
        grid.set(HexCoord::new(3, 3), 'b');
        assert_eq!(grid.crop_to_string(2, 2, 2, 2), "a.\n.b");
    }
}
